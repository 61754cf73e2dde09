use crate::arena::DEFAULT_CHUNK_SIZE;
use crate::cursor::{self, Cursor};
use crate::entry::Entry;
use crate::error::Result;
use crate::red_black_tree::node::Node;
use crate::red_black_tree::tree::Tree;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::result;

/// An ordered map implemented using a red black tree.
///
/// A red black tree is a self-balancing binary search tree that colors every node red or black.
/// The root is black, no red node has a red child, and every path from a node to an absent child
/// crosses the same number of black nodes. Together these keep the height within twice the
/// logarithm of the number of elements, so lookups, insertions and removals run in logarithmic
/// time.
///
/// # Examples
///
/// ```
/// use ordered_trees::red_black_tree::RedBlackMap;
///
/// let mut map = RedBlackMap::new();
/// map.insert(0, 1);
/// map.insert(3, 4);
///
/// assert_eq!(map[&0], 1);
/// assert_eq!(map.get(&1), None);
/// assert_eq!(map.len(), 2);
///
/// assert_eq!(map.min(), Some(&0));
///
/// map[&0] = 2;
/// assert_eq!(map.remove(&0), Some((0, 2)));
/// assert_eq!(map.remove(&1), None);
/// ```
pub struct RedBlackMap<T, U> {
    tree: Tree<T, U>,
}

impl<T, U> RedBlackMap<T, U> {
    /// Constructs a new, empty `RedBlackMap<T, U>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<u32, u32> = RedBlackMap::new();
    /// ```
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Constructs a new, empty `RedBlackMap<T, U>` whose nodes are allocated `chunk_size` at a
    /// time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        RedBlackMap {
            tree: Tree::new(chunk_size),
        }
    }

    /// Inserts a key-value pair into the map and returns a cursor to it together with `true`. If
    /// the key already exists, the map is left untouched and a cursor to the existing pair is
    /// returned together with `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// let (cursor, inserted) = map.insert(1, 1);
    /// assert!(inserted);
    ///
    /// assert_eq!(map.insert(1, 2), (cursor, false));
    /// assert_eq!(map.entry_at(cursor), Some((&1, &1)));
    /// ```
    pub fn insert(&mut self, key: T, value: U) -> (Cursor, bool)
    where
        T: Ord,
    {
        let (handle, inserted) = self.tree.add_node(key, value);
        (Cursor::at(handle), inserted)
    }

    /// Inserts a key-value pair into the map, overwriting the value if the key already exists.
    /// Returns a cursor to the pair together with `true`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// map.insert_or_assign(1, 2);
    /// assert_eq!(map[&1], 2);
    /// ```
    pub fn insert_or_assign(&mut self, key: T, value: U) -> (Cursor, bool)
    where
        T: Ord,
    {
        (Cursor::at(self.tree.insert_or_assign(key, value)), true)
    }

    /// Returns a cursor to the pair with a particular key, or the end cursor if there is none.
    pub fn find<V>(&self, key: &V) -> Cursor
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        Cursor::new(self.tree.find(key))
    }

    /// Removes the pair at `cursor` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIterator` if `cursor` is the end cursor or no longer designates a
    /// pair of this map.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::Error;
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// let (cursor, _) = map.insert(1, 1);
    /// assert_eq!(map.erase(cursor), Ok((1, 1)));
    /// assert_eq!(map.erase(cursor), Err(Error::InvalidIterator));
    /// ```
    pub fn erase(&mut self, cursor: Cursor) -> Result<(T, U)> {
        self.tree.erase(cursor).map(Entry::into_pair)
    }

    /// Removes a key-value pair from the map. If the key exists in the map, it will return the
    /// associated key-value pair. Otherwise it will return `None`.
    pub fn remove<V>(&mut self, key: &V) -> Option<(T, U)>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.delete_node(key).map(Entry::into_pair)
    }

    /// Checks if a key exists in the map.
    pub fn contains_key<V>(&self, key: &V) -> bool
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.contains(key)
    }

    /// Returns an immutable reference to the value associated with a particular key. It will
    /// return `None` if the key does not exist in the map.
    pub fn get<V>(&self, key: &V) -> Option<&U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.at(key).ok()
    }

    /// Returns a mutable reference to the value associated with a particular key. Returns `None`
    /// if such a key does not exist.
    pub fn get_mut<V>(&mut self, key: &V) -> Option<&mut U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.at_mut(key).ok()
    }

    /// Returns an immutable reference to the value associated with a particular key.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyNotFound` if the key does not exist in the map.
    pub fn at<V>(&self, key: &V) -> Result<&U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.at(key)
    }

    /// Returns a mutable reference to the value associated with a particular key.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyNotFound` if the key does not exist in the map.
    pub fn at_mut<V>(&mut self, key: &V) -> Result<&mut U>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.tree.at_mut(key)
    }

    /// Returns the key-value pair at `cursor`, or `None` for the end cursor.
    pub fn entry_at(&self, cursor: Cursor) -> Option<(&T, &U)> {
        self.tree
            .get(cursor)
            .map(|Entry { key, value }| (key, value))
    }

    /// Returns the key and a mutable reference to the value at `cursor`, or `None` for the end
    /// cursor.
    pub fn entry_at_mut(&mut self, cursor: Cursor) -> Option<(&T, &mut U)> {
        self.tree
            .get_mut(cursor)
            .map(|Entry { key, value }| (&*key, value))
    }

    /// Returns a cursor to the pair with the minimum key, or the end cursor if the map is empty.
    pub fn begin(&self) -> Cursor {
        self.tree.begin()
    }

    /// Returns the end cursor, the position one past the pair with the maximum key.
    pub fn end(&self) -> Cursor {
        Cursor::end()
    }

    /// Advances `cursor` to the next pair in key order, wrapping from the end cursor to the
    /// minimum.
    pub fn next(&self, cursor: Cursor) -> Cursor {
        self.tree.next(cursor)
    }

    /// Moves `cursor` to the previous pair in key order, wrapping from the end cursor to the
    /// maximum.
    pub fn prev(&self, cursor: Cursor) -> Cursor {
        self.tree.prev(cursor)
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an upper bound on the number of elements the map could hold on this platform.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Clears the map, removing all values.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the minimum key of the map. Returns `None` if the map is empty.
    pub fn min(&self) -> Option<&T> {
        self.tree.min().map(|entry| &entry.key)
    }

    /// Returns the maximum key of the map. Returns `None` if the map is empty.
    pub fn max(&self) -> Option<&T> {
        self.tree.max().map(|entry| &entry.key)
    }

    /// Returns the number of edges on the longest path from the root to a leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<_, _> = (1..=5).map(|key| (key, ())).collect();
    /// assert_eq!(map.height(), 2);
    /// ```
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Returns the number of black nodes on every path from the root to an absent child. Returns
    /// `None` if the paths disagree, which never happens for a map built through its public
    /// interface.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// assert_eq!(map.black_height(), Some(0));
    /// map.insert(1, 1);
    /// assert_eq!(map.black_height(), Some(1));
    /// ```
    pub fn black_height(&self) -> Option<usize> {
        self.tree.black_height()
    }

    /// Moves every pair of `other` whose key is not in this map into this map. Pairs whose key is
    /// already present are dropped, keeping the value of this map. `other` is left empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::red_black_tree::RedBlackMap;
    ///
    /// let mut map: RedBlackMap<_, _> = vec![(1, "x"), (3, "c")].into_iter().collect();
    /// let mut other: RedBlackMap<_, _> = vec![(1, "a"), (2, "b")].into_iter().collect();
    /// map.merge(&mut other);
    ///
    /// assert!(other.is_empty());
    /// assert_eq!(map[&1], "x");
    /// assert_eq!(map[&2], "b");
    /// ```
    pub fn merge(&mut self, other: &mut Self)
    where
        T: Ord,
    {
        let chunk_size = other.tree.chunk_size();
        let other = mem::replace(other, Self::with_chunk_size(chunk_size));
        self.tree.absorb(other.tree);
    }

    /// Swaps the contents of two maps.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Returns an iterator over the map. The iterator will yield key-value pairs in key order.
    pub fn iter(&self) -> RedBlackMapIter<'_, T, U> {
        RedBlackMapIter {
            inner: self.tree.iter(),
        }
    }

    /// Returns a mutable iterator over the map. The iterator will yield key-value pairs in key
    /// order.
    pub fn iter_mut(&mut self) -> RedBlackMapIterMut<'_, T, U> {
        RedBlackMapIterMut {
            inner: self.tree.iter_mut(),
        }
    }
}

impl<T, U> IntoIterator for RedBlackMap<T, U> {
    type IntoIter = RedBlackMapIntoIter<T, U>;
    type Item = (T, U);

    fn into_iter(self) -> Self::IntoIter {
        RedBlackMapIntoIter {
            inner: self.tree.into_entries(),
        }
    }
}

impl<'a, T, U> IntoIterator for &'a RedBlackMap<T, U>
where
    T: 'a,
    U: 'a,
{
    type IntoIter = RedBlackMapIter<'a, T, U>;
    type Item = (&'a T, &'a U);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, U> IntoIterator for &'a mut RedBlackMap<T, U>
where
    T: 'a,
    U: 'a,
{
    type IntoIter = RedBlackMapIterMut<'a, T, U>;
    type Item = (&'a T, &'a mut U);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// An owning iterator for `RedBlackMap<T, U>`.
///
/// This iterator traverses the elements of the map in-order and yields owned entries.
pub struct RedBlackMapIntoIter<T, U> {
    inner: cursor::IntoIter<T, U>,
}

impl<T, U> Iterator for RedBlackMapIntoIter<T, U> {
    type Item = (T, U);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, U> DoubleEndedIterator for RedBlackMapIntoIter<T, U> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T, U> ExactSizeIterator for RedBlackMapIntoIter<T, U> {}

/// An iterator for `RedBlackMap<T, U>`.
///
/// This iterator traverses the elements of the map in-order and yields immutable references.
pub struct RedBlackMapIter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    inner: cursor::Iter<'a, Node<T, U>>,
}

impl<'a, T, U> Iterator for RedBlackMapIter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    type Item = (&'a T, &'a U);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T, U> DoubleEndedIterator for RedBlackMapIter<'a, T, U> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, T, U> ExactSizeIterator for RedBlackMapIter<'a, T, U> {}

/// A mutable iterator for `RedBlackMap<T, U>`.
///
/// This iterator traverses the elements of the map in-order and yields mutable references.
pub struct RedBlackMapIterMut<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    inner: cursor::IterMut<'a, Node<T, U>>,
}

impl<'a, T, U> Iterator for RedBlackMapIterMut<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    type Item = (&'a T, &'a mut U);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T, U> DoubleEndedIterator for RedBlackMapIterMut<'a, T, U> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, T, U> ExactSizeIterator for RedBlackMapIterMut<'a, T, U> {}

impl<T, U> Default for RedBlackMap<T, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, U> Clone for RedBlackMap<T, U>
where
    T: Clone,
    U: Clone,
{
    fn clone(&self) -> Self {
        RedBlackMap {
            tree: self.tree.copy_tree(),
        }
    }
}

impl<T, U> PartialEq for RedBlackMap<T, U>
where
    T: PartialEq,
    U: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, U> Eq for RedBlackMap<T, U>
where
    T: Eq,
    U: Eq,
{
}

impl<T, U> fmt::Debug for RedBlackMap<T, U>
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, U> FromIterator<(T, U)> for RedBlackMap<T, U>
where
    T: Ord,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
    {
        let mut map = RedBlackMap::new();
        map.extend(iter);
        map
    }
}

impl<T, U> Extend<(T, U)> for RedBlackMap<T, U>
where
    T: Ord,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (T, U)>,
    {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, T, U, V> Index<&'a V> for RedBlackMap<T, U>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    type Output = U;

    fn index(&self, key: &V) -> &Self::Output {
        self.get(key).expect("Error: key does not exist.")
    }
}

impl<'a, T, U, V> IndexMut<&'a V> for RedBlackMap<T, U>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    fn index_mut(&mut self, key: &V) -> &mut Self::Output {
        self.get_mut(key).expect("Error: key does not exist.")
    }
}

impl<T, U> Serialize for RedBlackMap<T, U>
where
    T: Serialize,
    U: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

impl<'de, T, U> Deserialize<'de> for RedBlackMap<T, U>
where
    T: Deserialize<'de> + Ord,
    U: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RedBlackMapVisitor {
            marker: PhantomData,
        })
    }
}

struct RedBlackMapVisitor<T, U> {
    marker: PhantomData<fn() -> RedBlackMap<T, U>>,
}

impl<'de, T, U> Visitor<'de> for RedBlackMapVisitor<T, U>
where
    T: Deserialize<'de> + Ord,
    U: Deserialize<'de>,
{
    type Value = RedBlackMap<T, U>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M>(self, mut access: M) -> result::Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = RedBlackMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}
