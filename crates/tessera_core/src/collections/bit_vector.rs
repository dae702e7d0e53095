//! # Bit Vector
//!
//! Growable bitset backed by 64-bit words.
//!
//! Used for entity component masks, entity system masks and aspect masks.
//! The number of distinct bits is unbounded: the word array grows on demand
//! and every read past the end is treated as a zero bit.
//!
//! ## Performance
//!
//! - Insert / remove / contains: O(1) (insert may grow once)
//! - Set algebra: O(words)
//! - Iterate set bits: O(words + ones), skipping clean words

use std::hash::{Hash, Hasher};

const WORD_BITS: usize = 64;

/// A dynamically sized bit vector.
///
/// Equality and hashing only consider set bits, so two vectors holding the
/// same bits compare equal even when one carries extra zero words.
#[derive(Clone, Debug, Default)]
pub struct BitVector {
    /// Bitset: 64 bits per word, bit `i` lives in word `i / 64`.
    words: Vec<u64>,
}

impl BitVector {
    /// Creates an empty bit vector without allocating.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Creates an empty bit vector with room for `bits` bits.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; word_count_for(bits)],
        }
    }

    /// Creates a bit vector with every index yielded by `bits` set.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut vector = Self::new();
        for bit in bits {
            vector.insert(bit);
        }
        vector
    }

    /// Creates a bit vector from raw words (bit 0 of word 0 is index 0).
    #[must_use]
    pub fn from_words(words: &[u64]) -> Self {
        Self {
            words: words.to_vec(),
        }
    }

    /// Number of backing words currently allocated.
    #[inline]
    #[must_use]
    pub fn word_len(&self) -> usize {
        self.words.len()
    }

    /// Raw backing words.
    #[inline]
    #[must_use]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Sets bit `index`, growing as needed.
    ///
    /// Returns `true` if the bit was previously clear.
    pub fn insert(&mut self, index: usize) -> bool {
        let (word, mask) = locate(index);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let was_clear = self.words[word] & mask == 0;
        self.words[word] |= mask;
        was_clear
    }

    /// Clears bit `index`.
    ///
    /// Returns `true` if the bit was previously set.
    pub fn remove(&mut self, index: usize) -> bool {
        let (word, mask) = locate(index);
        match self.words.get_mut(word) {
            Some(bits) if *bits & mask != 0 => {
                *bits &= !mask;
                true
            }
            _ => false,
        }
    }

    /// Sets or clears bit `index`.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        if value {
            self.insert(index);
        } else {
            self.remove(index);
        }
    }

    /// Checks whether bit `index` is set.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        let (word, mask) = locate(index);
        self.words.get(word).is_some_and(|bits| bits & mask != 0)
    }

    /// Clears every bit, keeping the allocation.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Returns `true` if no bit is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// `self |= other`.
    pub fn union_with(&mut self, other: &Self) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (word, &rhs) in self.words.iter_mut().zip(&other.words) {
            *word |= rhs;
        }
    }

    /// `self &= other`.
    pub fn intersect_with(&mut self, other: &Self) {
        for (i, word) in self.words.iter_mut().enumerate() {
            *word &= other.word(i);
        }
    }

    /// `self &= !other`.
    pub fn difference_with(&mut self, other: &Self) {
        for (word, &rhs) in self.words.iter_mut().zip(&other.words) {
            *word &= !rhs;
        }
    }

    /// Returns `true` if every bit set in `other` is also set in `self`,
    /// i.e. `self & other == other`.
    #[must_use]
    pub fn contains_all(&self, other: &Self) -> bool {
        other
            .words
            .iter()
            .enumerate()
            .all(|(i, &rhs)| self.word(i) & rhs == rhs)
    }

    /// Returns `true` if `self & other` has at least one bit set.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(&lhs, &rhs)| lhs & rhs != 0)
    }

    /// Returns `true` if `self & other` is empty.
    #[inline]
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        !self.intersects(other)
    }

    /// Iterates over set bit indices in ascending order.
    ///
    /// Uses `trailing_zeros` to skip clean regions.
    #[must_use]
    pub fn iter(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }

    #[inline]
    fn word(&self, index: usize) -> u64 {
        self.words.get(index).copied().unwrap_or(0)
    }

    /// Length of the word array once trailing zero words are ignored.
    fn significant_len(&self) -> usize {
        self.words
            .iter()
            .rposition(|&word| word != 0)
            .map_or(0, |last| last + 1)
    }
}

#[inline]
const fn locate(index: usize) -> (usize, u64) {
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

#[inline]
const fn word_count_for(bits: usize) -> usize {
    (bits + WORD_BITS - 1) / WORD_BITS
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        let len = self.significant_len();
        len == other.significant_len() && self.words[..len] == other.words[..len]
    }
}

impl Eq for BitVector {}

impl Hash for BitVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.words[..self.significant_len()].hash(state);
    }
}

impl FromIterator<usize> for BitVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self::from_bits(iter)
    }
}

impl Extend<usize> for BitVector {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        for bit in iter {
            self.insert(bit);
        }
    }
}

impl<'a> IntoIterator for &'a BitVector {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the set bits of a [`BitVector`].
pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current_word: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                // Clear lowest set bit
                self.current_word &= self.current_word - 1;
                return Some(self.word_idx * WORD_BITS + bit);
            }
            self.word_idx += 1;
            self.current_word = *self.words.get(self.word_idx)?;
        }
    }
}
