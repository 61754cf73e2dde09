//! Ordered associative containers backed by binary search trees.
//!
//! Two tree variants share a single node-navigation layer:
//!
//! - `binary_tree::BinaryTreeMap` is an unbalanced binary search tree.
//! - `red_black_tree::RedBlackMap` and `red_black_tree::RedBlackSet` are backed by a red black
//!   tree and keep logarithmic height.
//!
//! Nodes are stored in a chunked `arena::TypedArena` and reference their parent, which lets a
//! `Cursor` walk the tree in either direction without an auxiliary stack.

pub mod arena;
pub mod binary_tree;
mod cursor;
mod entry;
mod error;
pub mod red_black_tree;

pub use crate::cursor::Cursor;
pub use crate::error::{Error, Result};
