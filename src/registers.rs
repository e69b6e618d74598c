//! ## Register stores
//! Fixed-size arrays of small unsigned counters addressed by register index.
//!
//! Two storage strategies are provided:
//! - `DenseRegisters` keeps one byte per register.
//! - `PackedRegisters<W>` keeps `W` bits per register (6 by default) inside `u32` words.
//!
//! Packed word encoding for `W = 6`:
//! - word[k] bits 0..29    - store registers `5k..5k+4`, 6 bits each, lowest register first
//! - word[k] bits 30..31   - unused
//!
//! Fields never straddle a word boundary, so every update touches exactly one word.

use std::fmt::{Debug, Formatter};
use std::mem::size_of_val;

/// Storage strategy of estimator registers.
///
/// Stores are created once with their final length and never resized. Indices passed to
/// `get` and `set` must be smaller than `len()`.
pub trait RegisterStore {
    /// Largest value a single register can hold
    const MAX_VALUE: u8;

    /// Create store of `len` registers set to zero
    fn with_len(len: usize) -> Self;

    /// Return number of registers
    fn len(&self) -> usize;

    /// Return whether store has no registers
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return value of `idx` register
    fn get(&self, idx: usize) -> u8;

    /// Set `idx` register to `value`, saturating at `MAX_VALUE`
    fn set(&mut self, idx: usize, value: u8);

    /// Set all registers to zero
    fn clear(&mut self);

    /// Return memory occupied by register storage in bytes
    fn memory_usage(&self) -> usize;
}

/// One byte per register
#[derive(Clone, PartialEq, Eq)]
pub struct DenseRegisters {
    data: Box<[u8]>,
}

impl RegisterStore for DenseRegisters {
    const MAX_VALUE: u8 = u8::MAX;

    #[inline]
    fn with_len(len: usize) -> Self {
        Self {
            data: vec![0u8; len].into_boxed_slice(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn get(&self, idx: usize) -> u8 {
        self.data[idx]
    }

    #[inline]
    fn set(&mut self, idx: usize, value: u8) {
        self.data[idx] = value;
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    #[inline]
    fn memory_usage(&self) -> usize {
        size_of_val(&*self.data)
    }
}

impl Debug for DenseRegisters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DenseRegisters {{ len: {}, size: {} }}", self.len(), self.memory_usage())
    }
}

/// `W` bits per register packed into `u32` words
#[derive(Clone, PartialEq, Eq)]
pub struct PackedRegisters<const W: usize = 6> {
    /// Number of registers
    len: usize,
    /// Packed register fields
    words: Box<[u32]>,
}

impl<const W: usize> PackedRegisters<W> {
    /// Ensure that `W` is in correct range at compile time
    const VALID_WIDTH: () = assert!(W >= 4 && W <= 8);
    /// Number of register fields stored in one `u32` word
    const PER_WORD: usize = 32 / W;
    /// Mask of a single register field
    const FIELD_MASK: u32 = (1 << W) - 1;

    /// Return word index and bit offset of `idx` register
    #[inline]
    fn locate(idx: usize) -> (usize, usize) {
        (idx / Self::PER_WORD, (idx % Self::PER_WORD) * W)
    }
}

impl<const W: usize> RegisterStore for PackedRegisters<W> {
    const MAX_VALUE: u8 = ((1u32 << W) - 1) as u8;

    #[inline]
    fn with_len(len: usize) -> Self {
        // compile time check of params
        _ = Self::VALID_WIDTH;

        Self {
            len,
            words: vec![0u32; len.div_ceil(Self::PER_WORD)].into_boxed_slice(),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn get(&self, idx: usize) -> u8 {
        debug_assert!(idx < self.len, "register index {idx} out of range");
        let (word_idx, bit_pos) = Self::locate(idx);
        ((self.words[word_idx] >> bit_pos) & Self::FIELD_MASK) as u8
    }

    #[inline]
    fn set(&mut self, idx: usize, value: u8) {
        debug_assert!(idx < self.len, "register index {idx} out of range");
        let value = u32::from(value.min(Self::MAX_VALUE));
        let (word_idx, bit_pos) = Self::locate(idx);
        let word = &mut self.words[word_idx];
        *word &= !(Self::FIELD_MASK << bit_pos);
        *word |= value << bit_pos;
    }

    fn clear(&mut self) {
        self.words.fill(0);
    }

    #[inline]
    fn memory_usage(&self) -> usize {
        size_of_val(&*self.words)
    }
}

impl<const W: usize> Debug for PackedRegisters<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PackedRegisters<{}> {{ len: {}, size: {} }}",
            W,
            self.len(),
            self.memory_usage()
        )
    }
}
