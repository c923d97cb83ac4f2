//! Arena storage for IR nodes.
//!
//! Nodes live for the whole compilation and are freed together with the
//! graph, so the arena never deallocates individual items. Edges between
//! nodes are `u32` ids, never references, which keeps the cyclic graph
//! free of reference counting.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Index of an item of type `T` in its arena.
pub struct Id<T> {
    raw: u32,
    _kind: PhantomData<fn() -> T>,
}

// Derives would demand the same bounds of `T`.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Id<T> {}
impl<T> Eq for Id<T> {}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}
impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.raw);
    }
}

impl<T> Id<T> {
    /// Marks an empty slot: a dead local or a state not yet set.
    pub const INVALID: Self = Self::new(u32::MAX);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Id {
            raw,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.raw
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.raw as usize
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.raw != u32::MAX
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.is_valid() {
            true => write!(f, "#{}", self.raw),
            false => f.write_str("#INVALID"),
        }
    }
}

/// Append-only storage; an item's id is its insertion position.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn alloc(&mut self, item: T) -> Id<T> {
        let id = Id::new(self.items.len() as u32);
        self.items.push(item);
        id
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.items.get(id.as_usize())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items paired with their ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> {
        (0u32..).map(Id::new).zip(self.items.iter())
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Id<T>> for Arena<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        &self.items[id.as_usize()]
    }
}

/// Dense side table keyed by arena ids, grown on write.
///
/// Holds per-node facts such as use lists outside the nodes themselves.
#[derive(Debug, Clone)]
pub struct SecondaryMap<K, V> {
    slots: Vec<V>,
    _key: PhantomData<fn(K)>,
}

impl<K, V: Default + Clone> SecondaryMap<K, V> {
    pub fn new() -> Self {
        SecondaryMap {
            slots: Vec::new(),
            _key: PhantomData,
        }
    }

    /// Grow to at least `len` slots, filling with `V::default()`.
    pub fn resize(&mut self, len: usize) {
        if self.slots.len() < len {
            self.slots.resize(len, V::default());
        }
    }

    pub fn get(&self, id: Id<K>) -> Option<&V> {
        self.slots.get(id.as_usize())
    }
}

impl<K, V: Default + Clone> Default for SecondaryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V: Default + Clone> Index<Id<K>> for SecondaryMap<K, V> {
    type Output = V;

    fn index(&self, id: Id<K>) -> &V {
        &self.slots[id.as_usize()]
    }
}

impl<K, V: Default + Clone> IndexMut<Id<K>> for SecondaryMap<K, V> {
    fn index_mut(&mut self, id: Id<K>) -> &mut V {
        self.resize(id.as_usize() + 1);
        &mut self.slots[id.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut arena: Arena<&str> = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(arena[b], "b");
        assert_eq!(arena.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_default_id_is_invalid() {
        let id: Id<u8> = Id::default();
        assert!(!id.is_valid());
        assert_eq!(format!("{:?}", id), "#INVALID");
        assert_eq!(format!("{:?}", Id::<u8>::new(3)), "#3");
    }

    #[test]
    fn test_secondary_map_grows_on_write() {
        let mut map: SecondaryMap<u8, Vec<u32>> = SecondaryMap::new();
        let id = Id::<u8>::new(5);
        assert!(map.get(id).is_none());
        map[id].push(7);
        assert_eq!(map.get(id), Some(&vec![7]));
        assert_eq!(map.get(Id::new(2)), Some(&Vec::new()));
    }
}
