use crate::arena::Handle;
use crate::cursor::TreeNode;
use crate::entry::Entry;

/// A node of the unbalanced tree.
///
/// `is_end` marks the node that currently holds the maximum key: stepping forward from it yields
/// the end position without climbing back to the root. Exactly one node of a non-empty tree carries
/// the flag.
pub struct Node<T, U> {
    pub entry: Entry<T, U>,
    pub parent: Option<Handle>,
    pub left: Option<Handle>,
    pub right: Option<Handle>,
    pub is_end: bool,
}

impl<T, U> Node<T, U> {
    pub fn new(key: T, value: U, parent: Option<Handle>) -> Self {
        Node {
            entry: Entry::new(key, value),
            parent,
            left: None,
            right: None,
            is_end: false,
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
}
