use crate::arena::{Handle, TypedArena};
use crate::binary_tree::node::Node;
use crate::cursor::{self, Cursor};
use crate::entry::Entry;
use crate::error::{Error, Result};
use log::{debug, trace};
use std::borrow::Borrow;
use std::cmp;
use std::mem;

/// An unbalanced binary search tree whose nodes live in an arena and link back to their parents.
///
/// Nothing bounds the height: inserting keys in sorted order produces a chain. Every walk is
/// therefore iterative so that degenerate trees cannot exhaust the stack.
pub struct Tree<T, U> {
    nodes: TypedArena<Node<T, U>>,
    root: Option<Handle>,
    len: usize,
}

impl<T, U> Tree<T, U> {
    pub fn new(chunk_size: usize) -> Self {
        Tree {
            nodes: TypedArena::new(chunk_size),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn chunk_size(&self) -> usize {
        self.nodes.chunk_size()
    }

    pub fn max_size(&self) -> usize {
        isize::MAX as usize / cmp::max(1, mem::size_of::<Node<T, U>>())
    }

    pub fn find<V>(&self, key: &V) -> Option<Handle>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        cursor::search(&self.nodes, self.root, key)
    }

    pub fn contains<V>(&self, key: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Inserts a new key-value pair. Returns `None` without touching the tree if the key is
    /// already present.
    pub fn insert(&mut self, key: T, value: U) -> Option<Handle>
    where
        T: Ord,
    {
        if self.contains(&key) {
            return None;
        }
        Some(self.attach(key, value))
    }

    /// Overwrites the value of an existing key in place, or inserts the pair if the key is absent.
    pub fn insert_or_assign(&mut self, key: T, value: U) -> Handle
    where
        T: Ord,
    {
        match self.find(&key) {
            Some(handle) => {
                self.nodes[handle].entry.value = value;
                handle
            },
            None => self.attach(key, value),
        }
    }

    // precondition: `key` is not in the tree
    fn attach(&mut self, key: T, value: U) -> Handle
    where
        T: Ord,
    {
        let mut parent = None;
        let mut is_left = false;
        let mut curr = self.root;
        while let Some(handle) = curr {
            let node = &self.nodes[handle];
            parent = Some(handle);
            is_left = key < node.entry.key;
            curr = if is_left { node.left } else { node.right };
        }

        let handle = self.nodes.allocate(Node::new(key, value, parent));
        match parent {
            None => {
                self.root = Some(handle);
                self.nodes[handle].is_end = true;
            },
            Some(parent) if is_left => self.nodes[parent].left = Some(handle),
            Some(parent) => {
                self.nodes[parent].right = Some(handle);
                // only a right child of the current maximum can become the new maximum
                if self.nodes[parent].is_end {
                    self.nodes[parent].is_end = false;
                    self.nodes[handle].is_end = true;
                }
            },
        }
        self.len += 1;
        handle
    }

    pub fn at<V>(&self, key: &V) -> Result<&U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        match self.find(key) {
            Some(handle) => Ok(&self.nodes[handle].entry.value),
            None => Err(Error::KeyNotFound),
        }
    }

    pub fn at_mut<V>(&mut self, key: &V) -> Result<&mut U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        match self.find(key) {
            Some(handle) => Ok(&mut self.nodes[handle].entry.value),
            None => Err(Error::KeyNotFound),
        }
    }

    pub fn get(&self, cursor: Cursor) -> Option<&Entry<T, U>> {
        cursor
            .node()
            .and_then(|handle| self.nodes.get(handle))
            .map(|node| &node.entry)
    }

    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut Entry<T, U>> {
        match cursor.node() {
            Some(handle) => self.nodes.get_mut(handle).map(|node| &mut node.entry),
            None => None,
        }
    }

    /// Unlinks and frees the node at `cursor`. Fails if the cursor is the end position or no
    /// longer references a live node.
    pub fn erase(&mut self, cursor: Cursor) -> Result<Entry<T, U>> {
        let handle = match cursor.node() {
            Some(handle) if self.nodes.contains(handle) => handle,
            _ => return Err(Error::InvalidIterator),
        };

        let (left, right) = {
            let node = &self.nodes[handle];
            (node.left, node.right)
        };
        match (left, right) {
            (None, _) => self.transplant(handle, right),
            (Some(_), None) => self.transplant(handle, left),
            (Some(left), Some(right)) => {
                let successor = cursor::min_from(&self.nodes, right);
                trace!("erasing node with two children through its successor");
                if successor != right {
                    let successor_right = self.nodes[successor].right;
                    self.transplant(successor, successor_right);
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                }
                self.transplant(handle, Some(successor));
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
            },
        }

        let node = self.nodes.free(handle);
        self.len -= 1;
        if node.is_end {
            self.mark_end();
        }
        Ok(node.entry)
    }

    fn transplant(&mut self, target: Handle, replacement: Option<Handle>) {
        let parent = self.nodes[target].parent;
        match parent {
            None => self.root = replacement,
            Some(parent) => {
                let parent_node = &mut self.nodes[parent];
                if parent_node.left == Some(target) {
                    parent_node.left = replacement;
                } else {
                    parent_node.right = replacement;
                }
            },
        }
        if let Some(replacement) = replacement {
            self.nodes[replacement].parent = parent;
        }
    }

    fn mark_end(&mut self) {
        if let Some(last) = cursor::last(&self.nodes, self.root) {
            self.nodes[last].is_end = true;
        }
    }

    pub fn clear(&mut self) {
        debug!("clearing binary tree of {} entries", self.len);
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    pub fn begin(&self) -> Cursor {
        Cursor::new(cursor::first(&self.nodes, self.root))
    }

    pub fn next(&self, cursor: Cursor) -> Cursor {
        match cursor.node().and_then(|handle| self.nodes.get(handle)) {
            Some(node) if node.is_end => Cursor::end(),
            _ => cursor::step_forward(&self.nodes, self.root, cursor),
        }
    }

    pub fn prev(&self, cursor: Cursor) -> Cursor {
        cursor::step_backward(&self.nodes, self.root, cursor)
    }

    pub fn min(&self) -> Option<&Entry<T, U>> {
        cursor::first(&self.nodes, self.root).map(|handle| &self.nodes[handle].entry)
    }

    pub fn max(&self) -> Option<&Entry<T, U>> {
        cursor::last(&self.nodes, self.root).map(|handle| &self.nodes[handle].entry)
    }

    pub fn height(&self) -> usize {
        cursor::height(&self.nodes, self.root)
    }

    /// Inserts a copy of every pair of `other` whose key is not already present. Pairs are visited
    /// in pre-order so that copying into an empty tree reproduces the shape of `other`.
    pub fn copy_unique(&mut self, other: &Tree<T, U>)
    where
        T: Ord + Clone,
        U: Clone,
    {
        debug!("copying {} entries into binary tree", other.len);
        for handle in cursor::pre_order(&other.nodes, other.root) {
            let Entry { key, value } = &other.nodes[handle].entry;
            if !self.contains(key) {
                self.attach(key.clone(), value.clone());
            }
        }
    }

    /// Moves every pair of `other` whose key is not already present into this tree, in pre-order.
    pub fn absorb(&mut self, mut other: Tree<T, U>)
    where
        T: Ord,
    {
        debug!("moving {} entries into binary tree", other.len);
        for handle in cursor::pre_order(&other.nodes, other.root) {
            let Entry { key, value } = other.nodes.free(handle).entry;
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> cursor::Iter<'_, Node<T, U>> {
        cursor::Iter::new(&self.nodes, self.root, self.len)
    }

    pub fn iter_mut(&mut self) -> cursor::IterMut<'_, Node<T, U>> {
        cursor::IterMut::new(&mut self.nodes, self.root)
    }

    pub fn into_entries(self) -> cursor::IntoIter<T, U> {
        cursor::IntoIter::new(self.nodes, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;
    use crate::cursor::{self, Cursor};
    use crate::error::Error;
    use std::fmt::Debug;

    fn assert_valid<T: Ord + Debug, U>(tree: &Tree<T, U>) {
        let handles = cursor::in_order(&tree.nodes, tree.root);
        assert_eq!(handles.len(), tree.len);
        assert_eq!(tree.nodes.len(), tree.len);
        for pair in handles.windows(2) {
            assert!(tree.nodes[pair[0]].entry.key < tree.nodes[pair[1]].entry.key);
        }
        for &handle in &handles {
            let node = &tree.nodes[handle];
            for &child in node.left.iter().chain(node.right.iter()) {
                assert_eq!(tree.nodes[child].parent, Some(handle));
            }
        }
        if let Some(root) = tree.root {
            assert_eq!(tree.nodes[root].parent, None);
        }
        let ends: Vec<_> = handles
            .iter()
            .cloned()
            .filter(|&handle| tree.nodes[handle].is_end)
            .collect();
        assert_eq!(ends, handles.last().cloned().into_iter().collect::<Vec<_>>());
    }

    fn keys<U>(tree: &Tree<u32, U>) -> Vec<u32> {
        tree.iter().map(|(key, _)| *key).collect()
    }

    fn build(keys: &[u32]) -> Tree<u32, u32> {
        let mut tree = Tree::new(4);
        for &key in keys {
            tree.insert(key, key * 10);
            assert_valid(&tree);
        }
        tree
    }

    #[test]
    fn test_empty() {
        let tree: Tree<u32, u32> = Tree::new(4);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.begin(), Cursor::end());
        assert_eq!(tree.next(Cursor::end()), Cursor::end());
        assert_eq!(tree.prev(Cursor::end()), Cursor::end());
        assert_eq!(tree.height(), 0);
        assert_valid(&tree);
    }

    #[test]
    fn test_insert_find() {
        let tree = build(&[5, 3, 8, 1, 4]);
        assert_eq!(tree.len(), 5);
        let handle = tree.find(&4).unwrap();
        assert_eq!(tree.nodes[handle].entry.value, 40);
        assert_eq!(tree.find(&6), None);
        assert_eq!(keys(&tree), vec![1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut tree = build(&[2, 1]);
        assert_eq!(tree.insert(2, 0), None);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.at(&2), Ok(&20));
        assert_valid(&tree);
    }

    #[test]
    fn test_insert_or_assign() {
        let mut tree = build(&[2, 1]);
        let handle = tree.insert_or_assign(2, 7);
        assert_eq!(Some(handle), tree.find(&2));
        assert_eq!(tree.at(&2), Ok(&7));
        tree.insert_or_assign(3, 30);
        assert_eq!(tree.len(), 3);
        assert_valid(&tree);
    }

    #[test]
    fn test_at() {
        let mut tree = build(&[2]);
        assert_eq!(tree.at(&1), Err(Error::KeyNotFound));
        *tree.at_mut(&2).unwrap() = 3;
        assert_eq!(tree.at(&2), Ok(&3));
        assert_eq!(tree.at_mut(&4), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_erase_without_left_child() {
        let mut tree = build(&[1, 2]);
        let entry = tree.erase(Cursor::new(tree.find(&1))).unwrap();
        assert_eq!((entry.key, entry.value), (1, 10));
        assert_eq!(keys(&tree), vec![2]);
        assert_valid(&tree);
    }

    #[test]
    fn test_erase_without_right_child() {
        let mut tree = build(&[2, 1]);
        tree.erase(Cursor::new(tree.find(&2))).unwrap();
        assert_eq!(keys(&tree), vec![1]);
        assert_valid(&tree);
    }

    #[test]
    fn test_erase_two_children_direct_successor() {
        let mut tree = build(&[2, 1, 3]);
        tree.erase(Cursor::new(tree.find(&2))).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.find(&2).is_none());
        assert!(tree.find(&1).is_some());
        assert!(tree.find(&3).is_some());
        assert_valid(&tree);
    }

    #[test]
    fn test_erase_two_children_deep_successor() {
        let mut tree = build(&[3, 2, 6, 4, 7, 5]);
        tree.erase(Cursor::new(tree.find(&3))).unwrap();
        assert_eq!(keys(&tree), vec![2, 4, 5, 6, 7]);
        let root = tree.root.unwrap();
        assert_eq!(tree.nodes[root].entry.key, 4);
        assert_valid(&tree);
    }

    #[test]
    fn test_erase_max_moves_end() {
        let mut tree = build(&[2, 1, 5, 4]);
        tree.erase(Cursor::new(tree.find(&5))).unwrap();
        let handle = tree.find(&4).unwrap();
        assert!(tree.nodes[handle].is_end);
        assert_eq!(tree.next(Cursor::at(handle)), Cursor::end());
        assert_valid(&tree);
    }

    #[test]
    fn test_erase_invalid() {
        let mut tree = build(&[1]);
        assert_eq!(tree.erase(Cursor::end()).err(), Some(Error::InvalidIterator));
        let stale = Cursor::new(tree.find(&1));
        tree.erase(stale).unwrap();
        assert_eq!(tree.erase(stale).err(), Some(Error::InvalidIterator));
        assert_eq!(tree.len(), 0);
        assert_valid(&tree);
    }

    #[test]
    fn test_height_degenerate() {
        let tree = build(&[1, 2, 3, 4, 5]);
        assert_eq!(tree.height(), 4);
    }

    #[test]
    fn test_long_chain() {
        let mut tree = Tree::new(1024);
        for key in 0..5_000u32 {
            tree.insert(key, ());
        }
        assert_eq!(tree.height(), 4_999);
        assert!(tree.contains(&4_999));
        assert_eq!(tree.max().map(|entry| entry.key), Some(4_999));
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert_valid(&tree);
    }

    #[test]
    fn test_cursor_cycle() {
        let tree = build(&[2, 1, 3]);
        let mut cursor = tree.begin();
        assert_eq!(tree.get(cursor).map(|entry| entry.key), Some(1));
        for _ in 0..3 {
            cursor = tree.next(cursor);
        }
        assert_eq!(cursor, Cursor::end());
        assert_eq!(tree.next(cursor), tree.begin());
        let last = tree.prev(Cursor::end());
        assert_eq!(tree.get(last).map(|entry| entry.key), Some(3));
        assert_eq!(tree.prev(tree.begin()), Cursor::end());
    }

    #[test]
    fn test_get_mut() {
        let mut tree = build(&[1]);
        let cursor = tree.begin();
        tree.get_mut(cursor).unwrap().value = 5;
        assert_eq!(tree.at(&1), Ok(&5));
        assert!(tree.get_mut(Cursor::end()).is_none());
    }

    #[test]
    fn test_copy_unique_preserves_shape() {
        let source = build(&[4, 2, 6, 1, 3, 5, 7]);
        let mut copy = Tree::new(4);
        copy.copy_unique(&source);
        assert_eq!(copy.height(), source.height());
        assert_eq!(keys(&copy), keys(&source));
        assert_valid(&copy);
    }

    #[test]
    fn test_copy_unique_skips_existing() {
        let source = build(&[1, 2]);
        let mut target = Tree::new(4);
        target.insert(1, 0);
        target.copy_unique(&source);
        assert_eq!(target.at(&1), Ok(&0));
        assert_eq!(target.at(&2), Ok(&20));
        assert_valid(&target);
    }

    #[test]
    fn test_absorb() {
        let source = build(&[1, 2, 3]);
        let mut target = build(&[3, 4]);
        target.absorb(source);
        assert_eq!(keys(&target), vec![1, 2, 3, 4]);
        assert_eq!(target.at(&3), Ok(&30));
        assert_valid(&target);
    }
}
