use crate::arena::DEFAULT_CHUNK_SIZE;
use crate::binary_tree::node::Node;
use crate::binary_tree::tree::Tree;
use crate::cursor::{self, Cursor};
use crate::entry::Entry;
use crate::error::Result;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::result;

/// An ordered map implemented using an unbalanced binary search tree.
///
/// Every operation runs in time proportional to the height of the tree, and nothing keeps that
/// height logarithmic: keys inserted in sorted order degrade the tree into a chain.
///
/// Positions inside the map are expressed with `Cursor`s. A cursor is obtained from `begin`,
/// `end`, `find` or an insertion, moved with `next` and `prev`, and dereferenced with `entry_at`.
///
/// # Examples
///
/// ```
/// use ordered_trees::binary_tree::BinaryTreeMap;
///
/// let mut map = BinaryTreeMap::new();
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
pub struct BinaryTreeMap<T, U> {
    tree: Tree<T, U>,
}

impl<T, U> BinaryTreeMap<T, U> {
    /// Constructs a new, empty `BinaryTreeMap<T, U>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let map: BinaryTreeMap<u32, u32> = BinaryTreeMap::new();
    /// ```
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Constructs a new, empty `BinaryTreeMap<T, U>` whose nodes are allocated `chunk_size` at a
    /// time.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let map: BinaryTreeMap<u32, u32> = BinaryTreeMap::with_chunk_size(64);
    /// ```
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        BinaryTreeMap {
            tree: Tree::new(chunk_size),
        }
    }

    /// Inserts a key-value pair into the map and returns a cursor to it together with `true`. If
    /// the key already exists, the map is left untouched and the end cursor is returned together
    /// with `false`; the existing pair is not reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// let (cursor, inserted) = map.insert(1, 1);
    /// assert!(inserted);
    /// assert_eq!(map.entry_at(cursor), Some((&1, &1)));
    ///
    /// assert_eq!(map.insert(1, 2), (map.end(), false));
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    pub fn insert(&mut self, key: T, value: U) -> (Cursor, bool)
    where
        T: Ord,
    {
        match self.tree.insert(key, value) {
            Some(handle) => (Cursor::at(handle), true),
            None => (Cursor::end(), false),
        }
    }

    /// Inserts a key-value pair into the map, overwriting the value if the key already exists.
    /// Returns a cursor to the pair together with `true`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// let (cursor, assigned) = map.insert_or_assign(1, 2);
    /// assert!(assigned);
    /// assert_eq!(map.entry_at(cursor), Some((&1, &2)));
    /// ```
    pub fn insert_or_assign(&mut self, key: T, value: U) -> (Cursor, bool)
    where
        T: Ord,
    {
        (Cursor::at(self.tree.insert_or_assign(key, value)), true)
    }

    /// Returns a cursor to the pair with a particular key, or the end cursor if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.entry_at(map.find(&1)), Some((&1, &1)));
    /// assert_eq!(map.find(&2), map.end());
    /// ```
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
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// let cursor = map.find(&1);
    /// assert_eq!(map.erase(cursor), Ok((1, 1)));
    /// assert_eq!(map.erase(map.end()), Err(Error::InvalidIterator));
    /// ```
    pub fn erase(&mut self, cursor: Cursor) -> Result<(T, U)> {
        self.tree.erase(cursor).map(Entry::into_pair)
    }

    /// Removes a key-value pair from the map. If the key exists in the map, it will return the
    /// associated key-value pair. Otherwise it will return `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.remove(&1), Some((1, 1)));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<V>(&mut self, key: &V) -> Option<(T, U)>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let cursor = self.find(key);
        self.erase(cursor).ok()
    }

    /// Checks if a key exists in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// assert!(!map.contains_key(&0));
    /// assert!(map.contains_key(&1));
    /// ```
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
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::Error;
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.at(&1), Ok(&1));
    /// assert_eq!(map.at(&2), Err(Error::KeyNotFound));
    /// ```
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
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// let (cursor, _) = map.insert(1, 1);
    /// if let Some((_, value)) = map.entry_at_mut(cursor) {
    ///     *value = 2;
    /// }
    /// assert_eq!(map[&1], 2);
    /// ```
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

    /// Advances `cursor` to the next pair in key order. Advancing from the maximum yields the end
    /// cursor, and advancing from the end cursor wraps around to the minimum.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let map: BinaryTreeMap<_, _> = vec![(2, 'b'), (1, 'a')].into_iter().collect();
    /// let mut cursor = map.begin();
    /// assert_eq!(map.entry_at(cursor), Some((&1, &'a')));
    /// cursor = map.next(cursor);
    /// assert_eq!(map.entry_at(cursor), Some((&2, &'b')));
    /// cursor = map.next(cursor);
    /// assert_eq!(cursor, map.end());
    /// assert_eq!(map.next(cursor), map.begin());
    /// ```
    pub fn next(&self, cursor: Cursor) -> Cursor {
        self.tree.next(cursor)
    }

    /// Moves `cursor` to the previous pair in key order. Retreating from the end cursor yields the
    /// maximum, and retreating from the minimum yields the end cursor.
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
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    /// map.clear();
    /// assert_eq!(map.is_empty(), true);
    /// ```
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
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let map: BinaryTreeMap<_, _> = (1..=5).map(|key| (key, ())).collect();
    /// assert_eq!(map.height(), 4);
    /// ```
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Moves every pair of `other` whose key is not in this map into this map. Pairs whose key is
    /// already present are dropped, keeping the value of this map. `other` is left empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map: BinaryTreeMap<_, _> = vec![(1, "x"), (3, "c")].into_iter().collect();
    /// let mut other: BinaryTreeMap<_, _> = vec![(1, "a"), (2, "b")].into_iter().collect();
    /// map.merge(&mut other);
    ///
    /// assert!(other.is_empty());
    /// assert_eq!(
    ///     map.into_iter().collect::<Vec<_>>(),
    ///     vec![(1, "x"), (2, "b"), (3, "c")],
    /// );
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
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next(), Some((&1, &1)));
    /// assert_eq!(iterator.next(), Some((&2, &2)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> BinaryTreeMapIter<'_, T, U> {
        BinaryTreeMapIter {
            inner: self.tree.iter(),
        }
    }

    /// Returns a mutable iterator over the map. The iterator will yield key-value pairs in key
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::binary_tree::BinaryTreeMap;
    ///
    /// let mut map = BinaryTreeMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    ///
    /// for (_, value) in &mut map {
    ///     *value += 1;
    /// }
    ///
    /// let mut iterator = map.iter_mut();
    /// assert_eq!(iterator.next(), Some((&1, &mut 2)));
    /// assert_eq!(iterator.next(), Some((&2, &mut 3)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter_mut(&mut self) -> BinaryTreeMapIterMut<'_, T, U> {
        BinaryTreeMapIterMut {
            inner: self.tree.iter_mut(),
        }
    }
}

impl<T, U> IntoIterator for BinaryTreeMap<T, U> {
    type IntoIter = BinaryTreeMapIntoIter<T, U>;
    type Item = (T, U);

    fn into_iter(self) -> Self::IntoIter {
        BinaryTreeMapIntoIter {
            inner: self.tree.into_entries(),
        }
    }
}

impl<'a, T, U> IntoIterator for &'a BinaryTreeMap<T, U>
where
    T: 'a,
    U: 'a,
{
    type IntoIter = BinaryTreeMapIter<'a, T, U>;
    type Item = (&'a T, &'a U);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, U> IntoIterator for &'a mut BinaryTreeMap<T, U>
where
    T: 'a,
    U: 'a,
{
    type IntoIter = BinaryTreeMapIterMut<'a, T, U>;
    type Item = (&'a T, &'a mut U);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// An owning iterator for `BinaryTreeMap<T, U>`.
///
/// This iterator traverses the elements of the map in-order and yields owned entries.
pub struct BinaryTreeMapIntoIter<T, U> {
    inner: cursor::IntoIter<T, U>,
}

impl<T, U> Iterator for BinaryTreeMapIntoIter<T, U> {
    type Item = (T, U);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, U> DoubleEndedIterator for BinaryTreeMapIntoIter<T, U> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T, U> ExactSizeIterator for BinaryTreeMapIntoIter<T, U> {}

/// An iterator for `BinaryTreeMap<T, U>`.
///
/// This iterator traverses the elements of the map in-order and yields immutable references.
pub struct BinaryTreeMapIter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    inner: cursor::Iter<'a, Node<T, U>>,
}

impl<'a, T, U> Iterator for BinaryTreeMapIter<'a, T, U>
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

impl<'a, T, U> DoubleEndedIterator for BinaryTreeMapIter<'a, T, U> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, T, U> ExactSizeIterator for BinaryTreeMapIter<'a, T, U> {}

/// A mutable iterator for `BinaryTreeMap<T, U>`.
///
/// This iterator traverses the elements of the map in-order and yields mutable references.
pub struct BinaryTreeMapIterMut<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    inner: cursor::IterMut<'a, Node<T, U>>,
}

impl<'a, T, U> Iterator for BinaryTreeMapIterMut<'a, T, U>
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

impl<'a, T, U> DoubleEndedIterator for BinaryTreeMapIterMut<'a, T, U> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<'a, T, U> ExactSizeIterator for BinaryTreeMapIterMut<'a, T, U> {}

impl<T, U> Default for BinaryTreeMap<T, U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, U> Clone for BinaryTreeMap<T, U>
where
    T: Ord + Clone,
    U: Clone,
{
    fn clone(&self) -> Self {
        let mut tree = Tree::new(self.tree.chunk_size());
        tree.copy_unique(&self.tree);
        BinaryTreeMap { tree }
    }
}

impl<T, U> PartialEq for BinaryTreeMap<T, U>
where
    T: PartialEq,
    U: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, U> Eq for BinaryTreeMap<T, U>
where
    T: Eq,
    U: Eq,
{
}

impl<T, U> fmt::Debug for BinaryTreeMap<T, U>
where
    T: fmt::Debug,
    U: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T, U> FromIterator<(T, U)> for BinaryTreeMap<T, U>
where
    T: Ord,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
    {
        let mut map = BinaryTreeMap::new();
        map.extend(iter);
        map
    }
}

impl<T, U> Extend<(T, U)> for BinaryTreeMap<T, U>
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

impl<'a, T, U, V> Index<&'a V> for BinaryTreeMap<T, U>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    type Output = U;

    fn index(&self, key: &V) -> &Self::Output {
        self.get(key).expect("Error: key does not exist.")
    }
}

impl<'a, T, U, V> IndexMut<&'a V> for BinaryTreeMap<T, U>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    fn index_mut(&mut self, key: &V) -> &mut Self::Output {
        self.get_mut(key).expect("Error: key does not exist.")
    }
}

impl<T, U> Serialize for BinaryTreeMap<T, U>
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

impl<'de, T, U> Deserialize<'de> for BinaryTreeMap<T, U>
where
    T: Deserialize<'de> + Ord,
    U: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BinaryTreeMapVisitor {
            marker: PhantomData,
        })
    }
}

struct BinaryTreeMapVisitor<T, U> {
    marker: PhantomData<fn() -> BinaryTreeMap<T, U>>,
}

impl<'de, T, U> Visitor<'de> for BinaryTreeMapVisitor<T, U>
where
    T: Deserialize<'de> + Ord,
    U: Deserialize<'de>,
{
    type Value = BinaryTreeMap<T, U>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M>(self, mut access: M) -> result::Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut map = BinaryTreeMap::new();
        while let Some((key, value)) = access.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}
