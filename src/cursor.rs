//! Parent-linked navigation shared by the tree variants.
//!
//! Both trees keep their nodes in a `TypedArena` and link them through handles, with every node
//! storing a non-owning handle to its parent. That back-reference is enough to walk the tree in
//! order in either direction without an auxiliary stack, which is what `Cursor` and the iterators
//! in this module do.

use crate::arena::{Handle, TypedArena};
use crate::entry::Entry;
use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::vec;

/// Read access to the links and payload of a tree node.
pub trait TreeNode: Sized {
    type Key;
    type Value;

    fn entry(&self) -> &Entry<Self::Key, Self::Value>;

    fn entry_mut(&mut self) -> &mut Entry<Self::Key, Self::Value>;

    fn into_entry(self) -> Entry<Self::Key, Self::Value>;

    fn parent(&self) -> Option<Handle>;

    fn left(&self) -> Option<Handle>;

    fn right(&self) -> Option<Handle>;

    /// Returns `true` if the node behind `handle` hangs off the left of its parent. The root is
    /// never a left child.
    fn is_left_child(nodes: &TypedArena<Self>, handle: Handle) -> bool {
        match nodes[handle].parent() {
            Some(parent) => nodes[parent].left() == Some(handle),
            None => false,
        }
    }
}

/// A position inside a tree: either a stored element or the end position one past the maximum.
///
/// A cursor does not borrow its container. It is a plain value that is handed back to the
/// container to move (`next`, `prev`) or to read and write the element it designates. Any
/// structural mutation of the container invalidates outstanding cursors; using a stale cursor
/// never touches freed memory, but it may resolve to the end position or to another element.
///
/// Advancing past the maximum reaches the end position and advancing once more wraps around to
/// the minimum. Retreating mirrors this.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Cursor {
    node: Option<Handle>,
}

impl Cursor {
    pub(crate) fn new(node: Option<Handle>) -> Self {
        Cursor { node }
    }

    pub(crate) fn at(handle: Handle) -> Self {
        Cursor { node: Some(handle) }
    }

    pub(crate) fn end() -> Self {
        Cursor { node: None }
    }

    pub(crate) fn node(self) -> Option<Handle> {
        self.node
    }

    /// Returns `true` if the cursor is the end position.
    pub fn is_end(self) -> bool {
        self.node.is_none()
    }
}

pub fn min_from<N: TreeNode>(nodes: &TypedArena<N>, mut handle: Handle) -> Handle {
    while let Some(left) = nodes[handle].left() {
        handle = left;
    }
    handle
}

pub fn max_from<N: TreeNode>(nodes: &TypedArena<N>, mut handle: Handle) -> Handle {
    while let Some(right) = nodes[handle].right() {
        handle = right;
    }
    handle
}

pub fn first<N: TreeNode>(nodes: &TypedArena<N>, root: Option<Handle>) -> Option<Handle> {
    root.map(|root| min_from(nodes, root))
}

pub fn last<N: TreeNode>(nodes: &TypedArena<N>, root: Option<Handle>) -> Option<Handle> {
    root.map(|root| max_from(nodes, root))
}

pub fn successor<N: TreeNode>(nodes: &TypedArena<N>, handle: Handle) -> Option<Handle> {
    if let Some(right) = nodes[handle].right() {
        return Some(min_from(nodes, right));
    }
    let mut curr = handle;
    while let Some(parent) = nodes[curr].parent() {
        if N::is_left_child(nodes, curr) {
            return Some(parent);
        }
        curr = parent;
    }
    None
}

pub fn predecessor<N: TreeNode>(nodes: &TypedArena<N>, handle: Handle) -> Option<Handle> {
    if let Some(left) = nodes[handle].left() {
        return Some(max_from(nodes, left));
    }
    let mut curr = handle;
    while let Some(parent) = nodes[curr].parent() {
        if !N::is_left_child(nodes, curr) {
            return Some(parent);
        }
        curr = parent;
    }
    None
}

pub fn step_forward<N: TreeNode>(
    nodes: &TypedArena<N>,
    root: Option<Handle>,
    cursor: Cursor,
) -> Cursor {
    match cursor.node {
        None => Cursor::new(first(nodes, root)),
        Some(handle) if nodes.contains(handle) => Cursor::new(successor(nodes, handle)),
        Some(_) => Cursor::end(),
    }
}

pub fn step_backward<N: TreeNode>(
    nodes: &TypedArena<N>,
    root: Option<Handle>,
    cursor: Cursor,
) -> Cursor {
    match cursor.node {
        None => Cursor::new(last(nodes, root)),
        Some(handle) if nodes.contains(handle) => Cursor::new(predecessor(nodes, handle)),
        Some(_) => Cursor::end(),
    }
}

pub fn search<N, V>(nodes: &TypedArena<N>, root: Option<Handle>, key: &V) -> Option<Handle>
where
    N: TreeNode,
    N::Key: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut curr = root;
    while let Some(handle) = curr {
        let node = &nodes[handle];
        curr = match key.cmp(node.entry().key.borrow()) {
            Ordering::Less => node.left(),
            Ordering::Greater => node.right(),
            Ordering::Equal => return Some(handle),
        };
    }
    None
}

/// Returns the number of edges on the longest root-to-leaf path. Empty and single-node trees both
/// have height zero.
pub fn height<N: TreeNode>(nodes: &TypedArena<N>, root: Option<Handle>) -> usize {
    let mut max_depth = 0;
    let mut stack = Vec::new();
    stack.extend(root.map(|root| (root, 0)));
    while let Some((handle, depth)) = stack.pop() {
        max_depth = cmp::max(max_depth, depth);
        let node = &nodes[handle];
        stack.extend(node.left().map(|left| (left, depth + 1)));
        stack.extend(node.right().map(|right| (right, depth + 1)));
    }
    max_depth
}

pub fn pre_order<N: TreeNode>(nodes: &TypedArena<N>, root: Option<Handle>) -> Vec<Handle> {
    let mut ret = Vec::with_capacity(nodes.len());
    let mut stack = Vec::new();
    stack.extend(root);
    while let Some(handle) = stack.pop() {
        ret.push(handle);
        let node = &nodes[handle];
        stack.extend(node.right());
        stack.extend(node.left());
    }
    ret
}

pub fn in_order<N: TreeNode>(nodes: &TypedArena<N>, root: Option<Handle>) -> Vec<Handle> {
    let mut ret = Vec::with_capacity(nodes.len());
    let mut curr = first(nodes, root);
    while let Some(handle) = curr {
        ret.push(handle);
        curr = successor(nodes, handle);
    }
    ret
}

/// In-order iterator that follows parent links from both ends.
pub struct Iter<'a, N> {
    nodes: &'a TypedArena<N>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, N: TreeNode> Iter<'a, N> {
    pub fn new(nodes: &'a TypedArena<N>, root: Option<Handle>, len: usize) -> Self {
        Iter {
            nodes,
            front: first(nodes, root),
            back: last(nodes, root),
            remaining: len,
        }
    }
}

impl<'a, N: TreeNode> Iterator for Iter<'a, N> {
    type Item = (&'a N::Key, &'a N::Value);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let handle = self.front?;
        self.front = successor(nodes, handle);
        self.remaining -= 1;
        let Entry { key, value } = nodes[handle].entry();
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, N: TreeNode> DoubleEndedIterator for Iter<'a, N> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let nodes = self.nodes;
        let handle = self.back?;
        self.back = predecessor(nodes, handle);
        self.remaining -= 1;
        let Entry { key, value } = nodes[handle].entry();
        Some((key, value))
    }
}

impl<'a, N: TreeNode> ExactSizeIterator for Iter<'a, N> {}

/// In-order iterator yielding mutable values.
///
/// Mutable references into the arena cannot be produced one parent hop at a time without aliasing
/// the arena, so the in-order rank of every node is computed up front and the arena's storage
/// order is permuted into it. Construction costs O(n log n) time and O(n) extra space.
pub struct IterMut<'a, N> {
    inner: vec::IntoIter<&'a mut N>,
}

impl<'a, N: TreeNode> IterMut<'a, N> {
    pub fn new(nodes: &'a mut TypedArena<N>, root: Option<Handle>) -> Self {
        let mut ranks: Vec<(Handle, usize)> = in_order(nodes, root)
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| (handle, rank))
            .collect();
        ranks.sort_unstable();
        let mut slots: Vec<Option<&'a mut N>> = (0..ranks.len()).map(|_| None).collect();
        for (handle, node) in nodes.iter_mut() {
            if let Ok(index) = ranks.binary_search_by_key(&handle, |&(handle, _)| handle) {
                slots[ranks[index].1] = Some(node);
            }
        }
        IterMut {
            inner: slots.into_iter().flatten().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl<'a, N: TreeNode> Iterator for IterMut<'a, N> {
    type Item = (&'a N::Key, &'a mut N::Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| {
            let entry = node.entry_mut();
            (&entry.key, &mut entry.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, N: TreeNode> DoubleEndedIterator for IterMut<'a, N> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|node| {
            let entry = node.entry_mut();
            (&entry.key, &mut entry.value)
        })
    }
}

impl<'a, N: TreeNode> ExactSizeIterator for IterMut<'a, N> {}

/// Owning in-order iterator.
pub struct IntoIter<K, V> {
    inner: vec::IntoIter<(K, V)>,
}

impl<K, V> IntoIter<K, V> {
    pub fn new<N>(mut nodes: TypedArena<N>, root: Option<Handle>) -> Self
    where
        N: TreeNode<Key = K, Value = V>,
    {
        let pairs: Vec<(K, V)> = in_order(&nodes, root)
            .into_iter()
            .map(|handle| nodes.free(handle).into_entry().into_pair())
            .collect();
        IntoIter {
            inner: pairs.into_iter(),
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
