use crate::arena::{Handle, TypedArena};
use crate::cursor::TreeNode;
use crate::entry::Entry;

/// An enum representing the color of a node in a red black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// A struct representing an internal node of a red black tree.
///
/// `is_left_child` caches which side of its parent the node hangs from. Every relink of the node
/// must update it; the root always has it cleared.
pub struct Node<T, U> {
    pub entry: Entry<T, U>,
    pub color: Color,
    pub is_left_child: bool,
    pub parent: Option<Handle>,
    pub left: Option<Handle>,
    pub right: Option<Handle>,
}

impl<T, U> Node<T, U> {
    pub fn new(key: T, value: U, parent: Option<Handle>, is_left_child: bool) -> Self {
        Node {
            entry: Entry::new(key, value),
            color: Color::Red,
            is_left_child,
            parent,
            left: None,
            right: None,
        }
    }

    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    pub fn child(&self, is_left: bool) -> Option<Handle> {
        if is_left {
            self.left
        } else {
            self.right
        }
    }

    pub fn child_mut(&mut self, is_left: bool) -> &mut Option<Handle> {
        if is_left {
            &mut self.left
        } else {
            &mut self.right
        }
    }
}

impl<T, U> TreeNode for Node<T, U> {
    type Key = T;
    type Value = U;

    fn entry(&self) -> &Entry<T, U> {
        &self.entry
    }

    fn entry_mut(&mut self) -> &mut Entry<T, U> {
        &mut self.entry
    }

    fn into_entry(self) -> Entry<T, U> {
        self.entry
    }

    fn parent(&self) -> Option<Handle> {
        self.parent
    }

    fn left(&self) -> Option<Handle> {
        self.left
    }

    fn right(&self) -> Option<Handle> {
        self.right
    }

    fn is_left_child(nodes: &TypedArena<Self>, handle: Handle) -> bool {
        nodes[handle].is_left_child
    }
}
