use crate::arena::{Handle, TypedArena};
use crate::cursor::{self, Cursor};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::red_black_tree::node::{Color, Node};
use log::{debug, trace};
use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::mem;

/// A red black tree whose nodes live in an arena and link back to their parents.
///
/// Insertion and deletion follow the classic bottom-up algorithms: the tree is modified like an
/// unbalanced binary search tree and then repaired by walking up from the modified position with
/// recolorings and at most a constant number of rotations per level.
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

    fn is_red(&self, node: Option<Handle>) -> bool {
        match node {
            Some(handle) => self.nodes[handle].is_red(),
            None => false,
        }
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

    /// Inserts a new key-value pair and rebalances. If the key is already present, the tree is
    /// left untouched and the handle of the existing node is returned together with `false`.
    pub fn add_node(&mut self, key: T, value: U) -> (Handle, bool)
    where
        T: Ord,
    {
        let mut parent = None;
        let mut is_left = false;
        let mut curr = self.root;
        while let Some(handle) = curr {
            let node = &self.nodes[handle];
            is_left = match key.cmp(&node.entry.key) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => return (handle, false),
            };
            parent = Some(handle);
            curr = node.child(is_left);
        }

        let handle = self
            .nodes
            .allocate(Node::new(key, value, parent, is_left));
        match parent {
            None => self.root = Some(handle),
            Some(parent) => *self.nodes[parent].child_mut(is_left) = Some(handle),
        }
        self.len += 1;
        self.insert_fixup(handle);
        (handle, true)
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
            None => self.add_node(key, value).0,
        }
    }

    fn insert_fixup(&mut self, mut node: Handle) {
        while let Some(parent) = self.nodes[node].parent {
            if !self.nodes[parent].is_red() {
                break;
            }
            let grandparent = self.nodes[parent]
                .parent
                .expect("Error: red node cannot be the root.");
            let parent_is_left = self.nodes[parent].is_left_child;
            let uncle = self.nodes[grandparent].child(!parent_is_left);

            if self.is_red(uncle) {
                trace!("insert fixup: recoloring under a red uncle");
                self.nodes[parent].color = Color::Black;
                if let Some(uncle) = uncle {
                    self.nodes[uncle].color = Color::Black;
                }
                self.nodes[grandparent].color = Color::Red;
                node = grandparent;
                continue;
            }

            let parent = if self.nodes[node].is_left_child != parent_is_left {
                trace!("insert fixup: straightening a triangle");
                self.rotate(parent, parent_is_left);
                node
            } else {
                parent
            };
            trace!("insert fixup: rotating a line at the grandparent");
            self.nodes[parent].color = Color::Black;
            self.nodes[grandparent].color = Color::Red;
            self.rotate(grandparent, !parent_is_left);
            break;
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Removes the node with a particular key and rebalances. Returns `None` if the key does not
    /// exist.
    pub fn delete_node<V>(&mut self, key: &V) -> Option<Entry<T, U>>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let handle = self.find(key)?;
        Some(self.unlink(handle))
    }

    /// Removes the node at `cursor`. Fails if the cursor is the end position or no longer
    /// references a live node.
    pub fn erase(&mut self, cursor: Cursor) -> Result<Entry<T, U>> {
        match cursor.node() {
            Some(handle) if self.nodes.contains(handle) => Ok(self.unlink(handle)),
            _ => Err(Error::InvalidIterator),
        }
    }

    fn unlink(&mut self, handle: Handle) -> Entry<T, U> {
        let (left, right, color, parent, is_left) = {
            let node = &self.nodes[handle];
            (
                node.left,
                node.right,
                node.color,
                node.parent,
                node.is_left_child,
            )
        };

        // the node that takes the vacated position, together with where that position hangs
        let (removed_color, replacement, parent, is_left) = match (left, right) {
            (None, _) => {
                self.transplant(handle, right);
                (color, right, parent, is_left)
            },
            (Some(_), None) => {
                self.transplant(handle, left);
                (color, left, parent, is_left)
            },
            (Some(left), Some(right)) => {
                trace!("erasing node with two children through its successor");
                let successor = cursor::min_from(&self.nodes, right);
                let (successor_color, replacement, successor_parent) = {
                    let node = &self.nodes[successor];
                    (node.color, node.right, node.parent)
                };

                let fixup_parent = if successor == right {
                    Some(successor)
                } else {
                    self.transplant(successor, replacement);
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                    successor_parent
                };
                self.transplant(handle, Some(successor));
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);
                self.nodes[successor].color = color;
                (successor_color, replacement, fixup_parent, successor != right)
            },
        };

        let node = self.nodes.free(handle);
        self.len -= 1;
        if removed_color == Color::Black {
            self.delete_fixup(replacement, parent, is_left);
        }
        node.entry
    }

    // `node` carries an extra black; `parent` and `is_left` locate it when it is absent
    fn delete_fixup(
        &mut self,
        mut node: Option<Handle>,
        mut parent: Option<Handle>,
        mut is_left: bool,
    ) {
        while node != self.root && !self.is_red(node) {
            let parent_handle = match parent {
                Some(parent_handle) => parent_handle,
                None => break,
            };
            let mut sibling = self.sibling(parent_handle, is_left);

            if self.nodes[sibling].is_red() {
                trace!("delete fixup: red sibling");
                self.nodes[sibling].color = Color::Black;
                self.nodes[parent_handle].color = Color::Red;
                self.rotate(parent_handle, is_left);
                sibling = self.sibling(parent_handle, is_left);
            }

            let near = self.nodes[sibling].child(is_left);
            let far = self.nodes[sibling].child(!is_left);
            if !self.is_red(near) && !self.is_red(far) {
                trace!("delete fixup: black nephews");
                self.nodes[sibling].color = Color::Red;
                node = Some(parent_handle);
                parent = self.nodes[parent_handle].parent;
                is_left = self.nodes[parent_handle].is_left_child;
                continue;
            }

            if !self.is_red(far) {
                trace!("delete fixup: red near nephew");
                if let Some(near) = near {
                    self.nodes[near].color = Color::Black;
                }
                self.nodes[sibling].color = Color::Red;
                self.rotate(sibling, !is_left);
                sibling = self.sibling(parent_handle, is_left);
            }

            trace!("delete fixup: red far nephew");
            self.nodes[sibling].color = self.nodes[parent_handle].color;
            self.nodes[parent_handle].color = Color::Black;
            if let Some(far) = self.nodes[sibling].child(!is_left) {
                self.nodes[far].color = Color::Black;
            }
            self.rotate(parent_handle, is_left);
            node = self.root;
            break;
        }

        if let Some(node) = node {
            self.nodes[node].color = Color::Black;
        }
    }

    fn sibling(&self, parent: Handle, is_left: bool) -> Handle {
        self.nodes[parent]
            .child(!is_left)
            .expect("Error: doubly black position without a sibling.")
    }

    fn transplant(&mut self, target: Handle, replacement: Option<Handle>) {
        let (parent, is_left) = {
            let node = &self.nodes[target];
            (node.parent, node.is_left_child)
        };
        match parent {
            None => self.root = replacement,
            Some(parent) => *self.nodes[parent].child_mut(is_left) = replacement,
        }
        if let Some(replacement) = replacement {
            let node = &mut self.nodes[replacement];
            node.parent = parent;
            node.is_left_child = is_left;
        }
    }

    // moves the child opposite to `is_left` into the position of `handle`
    fn rotate(&mut self, handle: Handle, is_left: bool) {
        let pivot = self.nodes[handle]
            .child(!is_left)
            .expect("Error: rotation without a pivot.");
        let inner = self.nodes[pivot].child(is_left);

        *self.nodes[handle].child_mut(!is_left) = inner;
        if let Some(inner) = inner {
            let node = &mut self.nodes[inner];
            node.parent = Some(handle);
            node.is_left_child = !is_left;
        }

        self.transplant(handle, Some(pivot));
        *self.nodes[pivot].child_mut(is_left) = Some(handle);
        let node = &mut self.nodes[handle];
        node.parent = Some(pivot);
        node.is_left_child = is_left;
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

    pub fn clear(&mut self) {
        debug!("clearing red black tree of {} entries", self.len);
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    pub fn begin(&self) -> Cursor {
        Cursor::new(cursor::first(&self.nodes, self.root))
    }

    pub fn next(&self, cursor: Cursor) -> Cursor {
        cursor::step_forward(&self.nodes, self.root, cursor)
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

    /// Returns the number of black nodes on every path from the root to an absent child, or `None`
    /// if two paths disagree.
    pub fn black_height(&self) -> Option<usize> {
        self.black_height_from(self.root)
    }

    fn black_height_from(&self, node: Option<Handle>) -> Option<usize> {
        let node = match node {
            Some(handle) => &self.nodes[handle],
            None => return Some(0),
        };
        let left = self.black_height_from(node.left)?;
        let right = self.black_height_from(node.right)?;
        if left != right {
            return None;
        }
        match node.color {
            Color::Red => Some(left),
            Color::Black => Some(left + 1),
        }
    }

    /// Returns a deep copy of the tree with the same shape and colors. The root of the copy is
    /// always black.
    pub fn copy_tree(&self) -> Self
    where
        T: Clone,
        U: Clone,
    {
        debug!("copying red black tree of {} entries", self.len);
        let mut nodes = TypedArena::new(self.nodes.chunk_size());
        let mut root = None;
        let mut stack = Vec::new();
        stack.extend(self.root.map(|handle| (handle, None)));
        while let Some((handle, parent)) = stack.pop() {
            let node = &self.nodes[handle];
            let Entry { key, value } = node.entry.clone();
            let mut copy = Node::new(key, value, parent, node.is_left_child);
            copy.color = node.color;
            let copy_handle = nodes.allocate(copy);
            match parent {
                None => root = Some(copy_handle),
                Some(parent) => {
                    *nodes[parent].child_mut(node.is_left_child) = Some(copy_handle);
                },
            }
            stack.extend(node.right.map(|right| (right, Some(copy_handle))));
            stack.extend(node.left.map(|left| (left, Some(copy_handle))));
        }

        if let Some(root) = root {
            nodes[root].color = Color::Black;
        }
        Tree {
            nodes,
            root,
            len: self.len,
        }
    }

    /// Moves every pair of `other` whose key is not already present into this tree.
    pub fn absorb(&mut self, other: Tree<T, U>)
    where
        T: Ord,
    {
        debug!("moving {} entries into red black tree", other.len);
        for (key, value) in other.into_entries() {
            self.add_node(key, value);
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
    use crate::red_black_tree::node::Color;
    use std::fmt::Debug;

    fn assert_valid<T: Ord + Debug, U>(tree: &Tree<T, U>) {
        if let Some(root) = tree.root {
            let node = &tree.nodes[root];
            assert_eq!(node.color, Color::Black);
            assert_eq!(node.parent, None);
            assert!(!node.is_left_child);
        }
        assert!(tree.black_height().is_some());

        let handles = cursor::in_order(&tree.nodes, tree.root);
        assert_eq!(handles.len(), tree.len);
        assert_eq!(tree.nodes.len(), tree.len);
        for pair in handles.windows(2) {
            assert!(tree.nodes[pair[0]].entry.key < tree.nodes[pair[1]].entry.key);
        }
        for &handle in &handles {
            let node = &tree.nodes[handle];
            for &(child, is_left) in &[(node.left, true), (node.right, false)] {
                if let Some(child) = child {
                    let child_node = &tree.nodes[child];
                    assert_eq!(child_node.parent, Some(handle));
                    assert_eq!(child_node.is_left_child, is_left);
                    assert!(!(node.is_red() && child_node.is_red()));
                }
            }
        }
    }

    fn keys<T: Clone, U>(tree: &Tree<T, U>) -> Vec<T> {
        tree.iter().map(|(key, _)| key.clone()).collect()
    }

    #[test]
    fn test_empty() {
        let tree: Tree<u32, u32> = Tree::new(16);
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.black_height(), Some(0));
        assert_eq!(tree.begin(), Cursor::end());
        assert_valid(&tree);
    }

    #[test]
    fn test_add_node_ascending() {
        let mut tree = Tree::new(16);
        for key in 1..=5 {
            assert!(tree.add_node(key, ()).1);
            assert_valid(&tree);
        }
        assert_eq!(tree.height(), 2);
        assert_eq!(keys(&tree), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_add_node_duplicate() {
        let mut tree = Tree::new(16);
        let (handle, inserted) = tree.add_node(1, "one");
        assert!(inserted);
        assert_eq!(tree.add_node(1, "uno"), (handle, false));
        assert_eq!(tree.at(&1), Ok(&"one"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_add_node_height() {
        let mut tree = Tree::new(16);
        for &key in &[5, 8, 18, 15, 17, 16, 25, 40, 80] {
            tree.add_node(key, ());
            assert_valid(&tree);
        }
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.black_height(), Some(2));
    }

    #[test]
    fn test_delete_node() {
        let mut tree = Tree::new(16);
        for &key in &[3, 1, 5, 7, 6, 8, 9, 10, 15] {
            tree.add_node(key, key * 10);
        }
        assert_valid(&tree);

        for &key in &[3, 5, 7] {
            assert_eq!(tree.delete_node(&key).map(|entry| entry.value), Some(key * 10));
            assert_valid(&tree);
        }
        for &key in &[0, 100, 3] {
            assert!(tree.delete_node(&key).is_none());
            assert_valid(&tree);
        }
        assert_eq!(tree.len(), 6);
        assert_eq!(keys(&tree), vec![1, 6, 8, 9, 10, 15]);
    }

    #[test]
    fn test_delete_all() {
        let mut tree = Tree::new(16);
        for i in 0..200 {
            tree.add_node((i * 37) % 200, ());
        }
        assert_valid(&tree);
        for i in 0..200 {
            assert!(tree.delete_node(&((i * 91) % 200)).is_some());
            assert_valid(&tree);
        }
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.root, None);
    }

    #[test]
    fn test_interleaved() {
        let mut tree = Tree::new(4);
        let mut state: u64 = 7;
        for _ in 0..2000 {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let key = (state >> 33) % 64;
            if state & 1 == 0 {
                tree.add_node(key, ());
            } else {
                tree.delete_node(&key);
            }
            assert_valid(&tree);
        }
    }

    #[test]
    fn test_height_is_logarithmic() {
        let mut tree = Tree::new(1024);
        for key in 0..1 << 12 {
            tree.add_node(key, ());
        }
        assert_valid(&tree);
        assert!(tree.height() < 2 * 13);
    }

    #[test]
    fn test_insert_or_assign() {
        let mut tree = Tree::new(16);
        let first = tree.insert_or_assign(1, 1);
        let second = tree.insert_or_assign(1, 2);
        assert_eq!(first, second);
        assert_eq!(tree.at(&1), Ok(&2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_erase() {
        let mut tree = Tree::new(16);
        for key in 0..10 {
            tree.add_node(key, ());
        }
        let cursor = Cursor::new(tree.find(&4));
        assert_eq!(tree.erase(cursor).map(|entry| entry.key), Ok(4));
        assert_valid(&tree);
        assert!(tree.erase(cursor).is_err());
        assert_eq!(tree.erase(Cursor::end()).err(), Some(Error::InvalidIterator));
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn test_at_missing() {
        let tree: Tree<u32, u32> = Tree::new(16);
        assert_eq!(tree.at(&1), Err(Error::KeyNotFound));
    }

    #[test]
    fn test_cursor_cycle() {
        let mut tree = Tree::new(16);
        for key in 1..=3 {
            tree.add_node(key, ());
        }
        let begin = tree.begin();
        let mut cursor = begin;
        for key in 1..=3 {
            assert_eq!(tree.get(cursor).map(|entry| entry.key), Some(key));
            cursor = tree.next(cursor);
        }
        assert_eq!(cursor, Cursor::end());
        assert_eq!(tree.next(cursor), begin);
        assert_eq!(tree.get(tree.prev(Cursor::end())).map(|entry| entry.key), Some(3));
        assert_eq!(tree.prev(begin), Cursor::end());
    }

    #[test]
    fn test_copy_tree() {
        let mut tree = Tree::new(16);
        for key in 0..50 {
            tree.add_node(key, key.to_string());
        }
        let copy = tree.copy_tree();
        assert_valid(&copy);
        assert_eq!(copy.len(), tree.len());
        assert_eq!(copy.height(), tree.height());
        assert_eq!(copy.black_height(), tree.black_height());
        assert!(copy.iter().eq(tree.iter()));

        tree.clear();
        assert_eq!(copy.at(&7), Ok(&String::from("7")));
    }

    #[test]
    fn test_absorb() {
        let mut tree = Tree::new(16);
        tree.add_node(1, "x");
        tree.add_node(3, "c");
        let mut other = Tree::new(16);
        other.add_node(1, "a");
        other.add_node(2, "b");
        tree.absorb(other);
        assert_valid(&tree);
        assert_eq!(
            tree.iter().collect::<Vec<_>>(),
            vec![(&1, &"x"), (&2, &"b"), (&3, &"c")],
        );
    }

    #[test]
    fn test_clear() {
        let mut tree = Tree::new(16);
        for key in 0..10 {
            tree.add_node(key, ());
        }
        tree.clear();
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.min(), None);
        assert_valid(&tree);
    }

    #[test]
    fn test_black_height_mismatch() {
        let mut tree = Tree::new(16);
        for key in 0..7 {
            tree.add_node(key, ());
        }
        assert_eq!(tree.black_height(), Some(2));

        let min = cursor::first(&tree.nodes, tree.root).unwrap();
        assert_ne!(Some(min), tree.root);
        let node = &mut tree.nodes[min];
        node.color = match node.color {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        };
        assert_eq!(tree.black_height(), None);
    }
}
