//! Binary search tree without any balancing, kept as a map.
//!
//! The tree's height depends entirely on insertion order. It is the simplest ordered container in
//! the crate and serves as the baseline the red-black tree improves on.

mod map;
mod node;
mod tree;

pub use self::map::{BinaryTreeMap, BinaryTreeMapIntoIter, BinaryTreeMapIter, BinaryTreeMapIterMut};
