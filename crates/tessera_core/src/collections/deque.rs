//! # Deque
//!
//! Double-ended queue over a circular buffer.
//!
//! ```text
//!            head            head + len
//!             v                 v
//! [ _ _ _ _ | A B C D E F | _ _ ]   logical index 0 = A
//! [ D E F _ _ _ _ _ _ _ | A B C ]   wrapped layout, same logical order
//! ```
//!
//! Pushing and popping at either end is O(1); inserting or removing in the
//! middle shifts whichever side of the hole is shorter. When the buffer is
//! full its capacity doubles and elements are re-laid out from slot 0.

use std::ops::{Index, IndexMut};

/// Smallest non-zero capacity allocated on growth.
const MIN_CAPACITY: usize = 4;

/// A growable double-ended queue.
#[derive(Clone, Debug)]
pub struct Deque<T> {
    /// Ring storage; `None` marks an unused slot.
    buffer: Vec<Option<T>>,
    /// Physical slot of logical index 0.
    head: usize,
    /// Number of stored elements.
    len: usize,
}

impl<T> Deque<T> {
    /// Creates an empty deque without allocating.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            head: 0,
            len: 0,
        }
    }

    /// Creates an empty deque with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, || None);
        Self {
            buffer,
            head: 0,
            len: 0,
        }
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the deque holds no element.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the deque can hold before growing.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Pushes an element at the front.
    pub fn add_to_front(&mut self, item: T) {
        self.grow_if_full();
        let capacity = self.capacity();
        self.head = (self.head + capacity - 1) % capacity;
        self.buffer[self.head] = Some(item);
        self.len += 1;
    }

    /// Pushes an element at the back.
    pub fn add_to_back(&mut self, item: T) {
        self.grow_if_full();
        let slot = self.physical(self.len);
        self.buffer[slot] = Some(item);
        self.len += 1;
    }

    /// Pops the front element.
    pub fn remove_from_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.buffer[self.head].take();
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        item
    }

    /// Pops the back element.
    pub fn remove_from_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let slot = self.physical(self.len - 1);
        self.len -= 1;
        self.buffer[slot].take()
    }

    /// Front element.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Back element.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Element at logical `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            self.buffer[self.physical(index)].as_ref()
        } else {
            None
        }
    }

    /// Element at logical `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            let slot = self.physical(index);
            self.buffer[slot].as_mut()
        } else {
            None
        }
    }

    /// Inserts `item` so that it ends up at logical `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, item: T) {
        assert!(
            index <= self.len,
            "insert index {index} out of range for deque of length {}",
            self.len
        );
        if index == 0 {
            self.add_to_front(item);
            return;
        }
        if index == self.len {
            self.add_to_back(item);
            return;
        }

        self.grow_if_full();
        for logical in (index..self.len).rev() {
            let from = self.physical(logical);
            let to = self.physical(logical + 1);
            self.buffer[to] = self.buffer[from].take();
        }
        let slot = self.physical(index);
        self.buffer[slot] = Some(item);
        self.len += 1;
    }

    /// Removes the element at logical `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let slot = self.physical(index);
        let item = self.buffer[slot].take();

        if index < self.len / 2 {
            // Shift the front part one slot towards the back
            for logical in (0..index).rev() {
                let from = self.physical(logical);
                let to = self.physical(logical + 1);
                self.buffer[to] = self.buffer[from].take();
            }
            self.head = (self.head + 1) % self.capacity();
        } else {
            for logical in index..self.len - 1 {
                let from = self.physical(logical + 1);
                let to = self.physical(logical);
                self.buffer[to] = self.buffer[from].take();
            }
        }
        self.len -= 1;
        item
    }

    /// Removes every element, keeping the allocation.
    pub fn clear(&mut self) {
        for logical in 0..self.len {
            let slot = self.physical(logical);
            self.buffer[slot] = None;
        }
        self.head = 0;
        self.len = 0;
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        (0..self.len).map(move |logical| &self[logical])
    }

    #[inline]
    fn physical(&self, logical: usize) -> usize {
        (self.head + logical) % self.buffer.len()
    }

    fn grow_if_full(&mut self) {
        if self.len < self.buffer.len() {
            return;
        }
        let new_capacity = (self.buffer.len() * 2).max(MIN_CAPACITY);
        let mut buffer: Vec<Option<T>> = Vec::with_capacity(new_capacity);
        for logical in 0..self.len {
            let slot = self.physical(logical);
            buffer.push(self.buffer[slot].take());
        }
        buffer.resize_with(new_capacity, || None);
        self.buffer = buffer;
        self.head = 0;
    }
}

impl<T: PartialEq> Deque<T> {
    /// Logical index of the first element equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.iter().position(|candidate| candidate == item)
    }

    /// Returns `true` if an element equal to `item` is present.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// Removes the first element equal to `item`.
    pub fn remove(&mut self, item: &T) -> bool {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for Deque<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.get(index).expect("deque index out of range")
    }
}

impl<T> IndexMut<usize> for Deque<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.get_mut(index).expect("deque index out of range")
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.add_to_back(item);
        }
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut deque = Self::new();
        deque.extend(iter);
        deque
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(deque: &Deque<i32>) -> Vec<i32> {
        deque.iter().copied().collect()
    }

    #[test]
    fn test_push_pop_both_ends() {
        let mut deque = Deque::new();
        deque.add_to_back(2);
        deque.add_to_back(3);
        deque.add_to_front(1);
        deque.add_to_front(0);
        assert_eq!(contents(&deque), vec![0, 1, 2, 3]);
        assert_eq!(deque.front(), Some(&0));
        assert_eq!(deque.back(), Some(&3));

        assert_eq!(deque.remove_from_front(), Some(0));
        assert_eq!(deque.remove_from_back(), Some(3));
        assert_eq!(contents(&deque), vec![1, 2]);
    }

    #[test]
    fn test_wraps_and_grows_in_order() {
        let mut deque = Deque::with_capacity(4);
        deque.extend([1, 2, 3]);
        assert_eq!(deque.remove_from_front(), Some(1));
        assert_eq!(deque.remove_from_front(), Some(2));
        // Head now sits near the end of the buffer
        deque.extend([4, 5, 6]);
        assert_eq!(deque.capacity(), 4);
        deque.add_to_back(7);
        assert_eq!(deque.capacity(), 8);
        assert_eq!(contents(&deque), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_insert_and_remove_middle() {
        let mut deque: Deque<i32> = [0, 1, 3, 4].into_iter().collect();
        deque.insert(2, 2);
        assert_eq!(contents(&deque), vec![0, 1, 2, 3, 4]);

        assert_eq!(deque.remove_at(1), Some(1));
        assert_eq!(contents(&deque), vec![0, 2, 3, 4]);
        assert_eq!(deque.remove_at(2), Some(3));
        assert_eq!(contents(&deque), vec![0, 2, 4]);
        assert_eq!(deque.remove_at(9), None);
    }

    #[test]
    fn test_remove_by_value() {
        let mut deque: Deque<i32> = (0..6).collect();
        assert!(deque.remove(&4));
        assert!(!deque.remove(&42));
        assert!(!deque.contains(&4));
        assert_eq!(deque.index_of(&5), Some(4));
    }

    #[test]
    fn test_empty_behaviour() {
        let mut deque: Deque<i32> = Deque::new();
        assert!(deque.is_empty());
        assert_eq!(deque.remove_from_front(), None);
        assert_eq!(deque.remove_from_back(), None);
        assert_eq!(deque.back(), None);
        deque.add_to_front(1);
        deque.clear();
        assert!(deque.is_empty());
        assert_eq!(deque.capacity(), MIN_CAPACITY);
    }
}
