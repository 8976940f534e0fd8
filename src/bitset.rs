//! A fixed-size, packed bit vector used for vertex sets throughout the crate. Vertex masks,
//! odd cycle transversals, two-colorings and the source/target sets of the flow network are
//! all `Bitset`s over the vertex id space of a graph.
//!
//! Bits beyond `num_bits` in the last word are always zero. Every operation that could set
//! them (`fill`, `invert`) masks them out again.

use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitset {
    num_bits: usize,
    words: Vec<u64>,
}

impl Bitset {

    /// Creates a `Bitset` of exactly `num_bits` bits, all zero.
    pub fn new(num_bits: usize) -> Self {
        Bitset {
            num_bits,
            words: vec![0; num_bits.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a `Bitset` of exactly `num_bits` bits, all one.
    pub fn full(num_bits: usize) -> Self {
        let mut bitset = Bitset::new(num_bits);
        bitset.fill();
        bitset
    }

    /// Creates a `Bitset` of `num_bits` bits with the bits in `ids` set.
    pub fn from_ids<I: IntoIterator<Item = usize>>(num_bits: usize, ids: I) -> Self {
        let mut bitset = Bitset::new(num_bits);
        for id in ids {
            bitset.set(id);
        }
        bitset
    }

    /// Returns the fixed length of `self` in bits.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn get(&self, bit: usize) -> bool {
        debug_assert!(bit < self.num_bits, "bit {} out of range {}", bit, self.num_bits);
        self.words[bit / WORD_BITS] & (1u64 << (bit % WORD_BITS)) != 0
    }

    pub fn set(&mut self, bit: usize) {
        debug_assert!(bit < self.num_bits, "bit {} out of range {}", bit, self.num_bits);
        self.words[bit / WORD_BITS] |= 1u64 << (bit % WORD_BITS);
    }

    pub fn unset(&mut self, bit: usize) {
        debug_assert!(bit < self.num_bits, "bit {} out of range {}", bit, self.num_bits);
        self.words[bit / WORD_BITS] &= !(1u64 << (bit % WORD_BITS));
    }

    pub fn toggle(&mut self, bit: usize) {
        debug_assert!(bit < self.num_bits, "bit {} out of range {}", bit, self.num_bits);
        self.words[bit / WORD_BITS] ^= 1u64 << (bit % WORD_BITS);
    }

    /// Returns the smallest set bit `>= from`, or `None` if there is none (also if `from` is out
    /// of range). Scans word by word, so iterating a dense set is amortized O(1) per bit.
    pub fn find(&self, from: usize) -> Option<usize> {
        if from >= self.num_bits {
            return None
        }
        let mut w = from / WORD_BITS;
        let mut word = self.words[w] & (!0u64 << (from % WORD_BITS));
        loop {
            if word != 0 {
                let bit = w * WORD_BITS + word.trailing_zeros() as usize;
                return (bit < self.num_bits).then_some(bit)
            }
            w += 1;
            if w >= self.words.len() {
                return None
            }
            word = self.words[w];
        }
    }

    /// Returns an `Iterator` over all set bits in ascending order.
    pub fn iter(&self) -> Ones<'_> {
        Ones { bitset: self, next: 0 }
    }

    /// Returns the number of set bits.
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Checks if no bit is set.
    pub fn is_clear(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Removes all bits of `other` from `self`. Only the words both sets have in common are
    /// touched; if `self` is longer, its excess bits stay as they are.
    pub fn setminus(&mut self, other: &Bitset) {
        for (d, s) in self.words.iter_mut().zip(other.words.iter()) {
            *d &= !*s;
        }
    }

    /// Adds all bits of `other` to `self`, over the common word range only (see `setminus`).
    pub fn join(&mut self, other: &Bitset) {
        for (d, s) in self.words.iter_mut().zip(other.words.iter()) {
            *d |= *s;
        }
        self.mask_padding();
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    pub fn fill(&mut self) {
        self.words.iter_mut().for_each(|word| *word = !0);
        self.mask_padding();
    }

    pub fn invert(&mut self) {
        self.words.iter_mut().for_each(|word| *word = !*word);
        self.mask_padding();
    }

    fn mask_padding(&mut self) {
        let padding = self.words.len() * WORD_BITS - self.num_bits;
        if padding > 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= !0u64 >> padding;
            }
        }
    }

}

/// `Iterator` over the set bits of a `Bitset`, see `Bitset::iter`.
pub struct Ones<'a> {
    bitset: &'a Bitset,
    next: usize,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let bit = self.bitset.find(self.next)?;
        self.next = bit + 1;
        Some(bit)
    }
}

impl<'a> IntoIterator for &'a Bitset {
    type Item = usize;
    type IntoIter = Ones<'a>;

    fn into_iter(self) -> Ones<'a> {
        self.iter()
    }
}

impl fmt::Display for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}:", self.count(), self.num_bits)?;
        for bit in self.iter() {
            write!(f, " {}", bit)?;
        }
        write!(f, "]")
    }
}
