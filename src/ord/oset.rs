use std::cmp::Ordering;
use std::fmt::Debug;
use std::marker::PhantomData;

use super::otree::{Cursor, Node, OTree};

/// An ordered set of unique values backed by an [`OTree`]. Values are kept
/// sorted under their `PartialOrd` ordering and a value comparing equal to a
/// stored one is rejected at insertion.
pub struct OSet<T: PartialOrd> {
    inner: OTree<T>,
}

impl<T: PartialOrd> OSet<T> {
    pub fn new() -> Self {
        Self {
            inner: OTree::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, key: &T) -> bool {
        self.find(key).value().is_some()
    }

    /// Iterator parked on the smallest element; an exhausted iterator equals
    /// [`Iter::default`].
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            at: self.inner.first(),
            marker: PhantomData,
        }
    }

    /// Iterator parked on the element equal to `key`, or the end iterator
    /// when no such element is stored.
    pub fn find(&self, key: &T) -> Iter<'_, T> {
        Iter {
            at: self.inner.find(key),
            marker: PhantomData,
        }
    }

    /// Attempts to add `value`. Returns the iterator to the freshly inserted
    /// element and `true`, or the iterator to the already stored equal
    /// element and `false`, in which case the set is unchanged and `value` is
    /// dropped.
    pub fn insert(&mut self, value: T) -> (Iter<'_, T>, bool) {
        let (at, inserted) = self.inner.insert(value, true);
        (
            Iter {
                at,
                marker: PhantomData,
            },
            inserted,
        )
    }

    /// Removes the element equal to `key`. Reports whether an element was
    /// removed; asking twice for the same key removes once.
    pub fn remove(&mut self, key: &T) -> bool {
        self.find_mut(key).remove().is_some()
    }

    /// Removes every element in `[from, to)` and reports how many were
    /// removed. Each erase continues from the cursor the previous erase
    /// produced, so the walk survives its own invalidations.
    pub fn remove_range(&mut self, from: &T, to: &T) -> usize {
        let mut removed = 0;
        let mut cur = self.inner.lower_bound(from);
        while let Some(value) = self.inner.value(cur) {
            if value.partial_cmp(to).expect("Failed to compare values") != Ordering::Less {
                break;
            }
            cur = self.inner.erase(cur).0;
            removed += 1;
        }
        removed
    }

    /// Mutating cursor parked on the element equal to `key`, or at the end
    /// position when no such element is stored.
    pub fn find_mut(&mut self, key: &T) -> CursorMut<'_, T> {
        let at = self.inner.find(key);
        CursorMut {
            tree: &mut self.inner,
            at,
        }
    }

    /// Mutating cursor parked on the smallest element.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, T> {
        let at = self.inner.first();
        CursorMut {
            tree: &mut self.inner,
            at,
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Exchanges the contents of two sets in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.inner, &mut other.inner);
    }
}

impl<T: PartialOrd> Default for OSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialOrd + Clone> Clone for OSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: PartialOrd + Debug> Debug for OSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialOrd> Extend<T> for OSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: PartialOrd> FromIterator<T> for OSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: PartialOrd, const N: usize> From<[T; N]> for OSet<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T: PartialOrd> IntoIterator for &'a OSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Two sets are equal when their sorted sequences match element by element.
impl<T: PartialOrd> PartialEq for OSet<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

/// Sets order lexicographically over their sorted sequences: the first
/// mismatching element decides, and a proper prefix is the smaller set.
impl<T: PartialOrd> PartialOrd for OSet<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

/// A read cursor over a set, wrapping one tree cursor. The borrow it holds
/// keeps the set immutable for as long as the iterator is alive, so a live
/// `Iter` can never dangle.
pub struct Iter<'a, T: PartialOrd> {
    at: Cursor<T>,
    marker: PhantomData<&'a T>,
}

impl<'a, T: PartialOrd> Iter<'a, T> {
    /// The element under the cursor, or `None` at the end position.
    pub fn value(&self) -> Option<&'a T> {
        self.at.node.map(|n| unsafe { &(*n.as_ptr()).value })
    }

    /// Steps to the next element in sorted order. Advancing the end iterator
    /// is a caller error.
    pub fn advance(&mut self) {
        match self.at.node {
            Some(n) => self.at.node = unsafe { Node::successor(n) },
            None => debug_assert!(false, "advanced past the end iterator"),
        }
    }

    /// Steps to the previous element in sorted order; from the first element
    /// this lands on the end position. Retreating the end iterator is a
    /// caller error.
    pub fn retreat(&mut self) {
        match self.at.node {
            Some(n) => self.at.node = unsafe { Node::predecessor(n) },
            None => debug_assert!(false, "retreated from the end iterator"),
        }
    }
}

impl<T: PartialOrd> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            at: self.at,
            marker: PhantomData,
        }
    }
}

/// The null iterator: the end position of any set, equal only to other end
/// iterators.
impl<T: PartialOrd> Default for Iter<'_, T> {
    fn default() -> Self {
        Self {
            at: Cursor::default(),
            marker: PhantomData,
        }
    }
}

impl<T: PartialOrd> PartialEq for Iter<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl<T: PartialOrd + Debug> Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Iter").field(&self.value()).finish()
    }
}

impl<'a, T: PartialOrd> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let n = self.at.node?;
        let value = unsafe { &(*n.as_ptr()).value };
        self.at.node = unsafe { Node::successor(n) };
        Some(value)
    }
}

/// A mutating cursor over a set. [`CursorMut::remove`] erases the element
/// under the cursor and moves on to its in-order successor, which keeps the
/// cursor usable across its own erasures; positions held elsewhere are
/// untouched.
pub struct CursorMut<'a, T: PartialOrd> {
    tree: &'a mut OTree<T>,
    at: Cursor<T>,
}

impl<T: PartialOrd> CursorMut<'_, T> {
    /// The element under the cursor, or `None` at the end position.
    pub fn value(&self) -> Option<&T> {
        self.tree.value(self.at)
    }

    /// Steps to the next element in sorted order.
    pub fn advance(&mut self) {
        self.at = self.tree.next(self.at);
    }

    /// Steps to the previous element in sorted order; from the end position
    /// this lands on the largest element.
    pub fn retreat(&mut self) {
        self.at = self.tree.prev(self.at);
    }

    /// Removes the element under the cursor and leaves the cursor on its
    /// in-order successor (the end position when the largest element was
    /// removed). At the end position nothing is referenced and `None` is
    /// returned.
    pub fn remove(&mut self) -> Option<T> {
        if self.at.node.is_none() {
            return None;
        }
        let (next, value) = self.tree.erase(self.at);
        self.at = next;
        Some(value)
    }
}
