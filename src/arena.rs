//! Chunked slab allocator that stores the nodes of a tree.

use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// Number of nodes allocated per chunk when no chunk size is given.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// A stable reference to an object inside a `TypedArena<T>`.
///
/// A handle stays valid until the object it references is freed. Once freed, the slot is recycled
/// by the next allocation, so a stale handle may resolve to a different object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Handle {
    chunk_index: usize,
    block_index: usize,
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<Handle>),
}

/// An allocator for a single type of object that hands out `Handle`s instead of references.
///
/// Objects live in fixed-size chunks that are never reallocated, so growing the arena does not
/// move existing objects. Freed slots are threaded onto a free list and reused before a new chunk
/// is requested. The arena contains no unsafe code: every chunk is a plain `Vec`.
///
/// # Examples
///
/// ```
/// use ordered_trees::arena::TypedArena;
///
/// let mut arena = TypedArena::new(16);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Handle>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    len: usize,
    capacity: usize,
}

impl<T> TypedArena<T> {
    fn block(&self, handle: Handle) -> Option<&Block<T>> {
        self.chunks
            .get(handle.chunk_index)
            .and_then(|chunk| chunk.get(handle.block_index))
    }

    fn block_mut(&mut self, handle: Handle) -> Option<&mut Block<T>> {
        self.chunks
            .get_mut(handle.chunk_index)
            .and_then(|chunk| chunk.get_mut(handle.block_index))
    }

    /// Constructs a new, empty `TypedArena<T>` that allocates `chunk_size` objects per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::arena::TypedArena;
    ///
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// assert_eq!(arena.chunk_size(), 1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "Error: chunk size must be positive.");
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size,
            len: 0,
            capacity: 0,
        }
    }

    /// Allocates an object in the arena and returns its handle.
    pub fn allocate(&mut self, value: T) -> Handle {
        if self.len == self.capacity {
            self.chunks.push(Vec::with_capacity(self.chunk_size));
            self.capacity += self.chunk_size;
        }
        self.len += 1;

        match self.head.take() {
            None => {
                // without vacant blocks, only the last chunk can have spare room
                let chunk_index = self.chunks.len() - 1;
                let chunk = &mut self.chunks[chunk_index];
                chunk.push(Block::Occupied(value));
                Handle {
                    chunk_index,
                    block_index: chunk.len() - 1,
                }
            },
            Some(handle) => {
                let vacant_block = mem::replace(
                    &mut self.chunks[handle.chunk_index][handle.block_index],
                    Block::Occupied(value),
                );
                match vacant_block {
                    Block::Vacant(next) => {
                        self.head = next;
                        handle
                    },
                    Block::Occupied(_) => panic!("Error: free list references an occupied block."),
                }
            },
        }
    }

    /// Deallocates an object in the arena and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not reference an occupied slot.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(x), 0);
    /// assert_eq!(arena.get(x), None);
    /// ```
    pub fn free(&mut self, handle: Handle) -> T {
        let next = self.head;
        let block = self
            .block_mut(handle)
            .expect("Error: attempting to free invalid block.");
        match mem::replace(block, Block::Vacant(next)) {
            Block::Occupied(value) => {
                self.len -= 1;
                self.head = Some(handle);
                value
            },
            Block::Vacant(next) => {
                *block = Block::Vacant(next);
                panic!("Error: attempting to free vacant block.");
            },
        }
    }

    /// Returns an immutable reference to an object in the arena, or `None` if the handle does not
    /// reference an occupied slot.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.block(handle) {
            Some(Block::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to an object in the arena, or `None` if the handle does not
    /// reference an occupied slot.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.block_mut(handle) {
            Some(Block::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if `handle` references an occupied slot.
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of objects allocated per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Drops every object in the arena and releases all chunks. Previously issued handles become
    /// invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use ordered_trees::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// arena.clear();
    /// assert!(arena.is_empty());
    /// assert_eq!(arena.get(x), None);
    /// ```
    pub fn clear(&mut self) {
        self.head = None;
        self.chunks.clear();
        self.len = 0;
        self.capacity = 0;
    }

    /// Returns an iterator over every live object and its handle, in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> + '_ {
        self.chunks
            .iter_mut()
            .enumerate()
            .flat_map(|(chunk_index, chunk)| {
                chunk
                    .iter_mut()
                    .enumerate()
                    .filter_map(move |(block_index, block)| {
                        match block {
                            Block::Occupied(value) => {
                                Some((
                                    Handle {
                                        chunk_index,
                                        block_index,
                                    },
                                    value,
                                ))
                            },
                            Block::Vacant(_) => None,
                        }
                    })
            })
    }
}

impl<T> Index<Handle> for TypedArena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(handle).expect("Error: handle out of bounds.")
    }
}

impl<T> IndexMut<Handle> for TypedArena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(handle).expect("Error: handle out of bounds.")
    }
}

#[cfg(test)]
mod tests {
    use super::{Handle, TypedArena};

    #[test]
    #[should_panic]
    fn test_zero_chunk_size() {
        let _: TypedArena<u32> = TypedArena::new(0);
    }

    #[test]
    #[should_panic]
    fn test_free_invalid_block() {
        let mut arena: TypedArena<u32> = TypedArena::new(1024);
        arena.free(Handle {
            chunk_index: 0,
            block_index: 0,
        });
    }

    #[test]
    #[should_panic]
    fn test_free_twice() {
        let mut arena = TypedArena::new(1024);
        let handle = arena.allocate(0);
        arena.free(handle);
        arena.free(handle);
    }

    #[test]
    fn test_allocate_multiple_chunks() {
        let mut arena = TypedArena::new(2);
        let handles: Vec<Handle> = (0..5).map(|i| arena.allocate(i)).collect();
        assert_eq!(arena.len(), 5);
        assert_eq!(
            handles[2],
            Handle {
                chunk_index: 1,
                block_index: 0
            },
        );
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(arena[handle], i);
        }
    }

    #[test]
    fn test_free_recycles_slot() {
        let mut arena = TypedArena::new(1024);
        let first = arena.allocate(0);
        let second = arena.allocate(1);
        assert_eq!(arena.free(first), 0);
        assert_eq!(arena.allocate(2), first);
        assert_eq!(arena[first], 2);
        assert_eq!(arena[second], 1);
    }

    #[test]
    fn test_recycle_after_full_chunk() {
        let mut arena = TypedArena::new(2);
        let first = arena.allocate(0);
        arena.allocate(1);
        arena.free(first);
        let third = arena.allocate(2);
        assert_eq!(third, first);
        arena.allocate(3);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_get_vacant_block() {
        let mut arena = TypedArena::new(1024);
        let handle = arena.allocate(0);
        arena.free(handle);
        assert_eq!(arena.get(handle), None);
        assert_eq!(arena.get_mut(handle), None);
        assert!(!arena.contains(handle));
    }

    #[test]
    fn test_get_mut() {
        let mut arena = TypedArena::new(1024);
        let handle = arena.allocate(0);
        *arena.get_mut(handle).unwrap() = 1;
        assert_eq!(arena.get(handle), Some(&1));
    }

    #[test]
    fn test_clear() {
        let mut arena = TypedArena::new(2);
        for i in 0..5 {
            arena.allocate(i);
        }
        arena.clear();
        assert!(arena.is_empty());
        let handle = arena.allocate(7);
        assert_eq!(
            handle,
            Handle {
                chunk_index: 0,
                block_index: 0
            },
        );
    }

    #[test]
    fn test_iter_mut_skips_vacant() {
        let mut arena = TypedArena::new(1024);
        let first = arena.allocate(1);
        arena.allocate(2);
        arena.allocate(3);
        arena.free(first);
        for (_, value) in arena.iter_mut() {
            *value *= 10;
        }
        let mut values: Vec<u32> = arena.iter_mut().map(|(_, value)| *value).collect();
        values.sort();
        assert_eq!(values, vec![20, 30]);
    }
}
