// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Bit vectors of reconstructed signal values

use core::fmt;
use core::str::FromStr;

use crate::config::BitOrder;

/// Value of a single signal, most significant bit first
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bits(Vec<bool>);

impl Bits {
    /// Create a value of the given `width` from the lowest bits of `value`
    pub fn from_u128(value: u128, width: u32) -> Self {
        (0..width)
            .rev()
            .map(|i| value.checked_shr(i).is_some_and(|v| v & 1 != 0))
            .collect()
    }

    /// Retrieve the width of this value
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Determine whether this value has no bits at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Retrieve the individual bits, most significant bit first
    pub fn as_slice(&self) -> &[bool] {
        self.0.as_slice()
    }

    /// Iterate over the individual bits, most significant bit first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = bool> + ExactSizeIterator + '_ {
        self.0.iter().copied()
    }

    /// Convert this value to an integer
    ///
    /// Returns [`None`] if the value is wider than 128 bits.
    pub fn to_u128(&self) -> Option<u128> {
        (self.len() <= 128).then(|| self.iter().fold(0, |acc, b| (acc << 1) | u128::from(b)))
    }
}

impl FromIterator<bool> for Bits {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|b| f.write_str(if *b { "1" } else { "0" }))
    }
}

impl FromStr for Bits {
    type Err = InvalidDigit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                c => Err(InvalidDigit(c)),
            })
            .collect()
    }
}

/// A character other than `0` or `1` in a textual bit vector
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidDigit(pub char);

impl core::error::Error for InvalidDigit {}

impl fmt::Display for InvalidDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid binary digit '{}'", self.0)
    }
}

/// Accumulator collecting the bits of a single signal
///
/// Bits are pushed in the order they are consumed from the trace. Once the
/// signal's width is reached, the accumulated value is handed out as [`Bits`]
/// and the accumulator is ready for the next signal.
#[derive(Clone, Debug)]
pub(super) struct Accumulator {
    bits: Vec<bool>,
    collected: usize,
    order: BitOrder,
}

impl Accumulator {
    /// Create a new accumulator
    pub fn new(order: BitOrder) -> Self {
        Self {
            bits: Vec::new(),
            collected: 0,
            order,
        }
    }

    /// Prepare for a signal of the given width, discarding any collected bits
    pub fn reset(&mut self, width: usize) {
        self.bits.clear();
        self.bits.resize(width, false);
        self.collected = 0;
    }

    /// Retrieve the number of bits collected for the current signal
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// Push the next bit
    ///
    /// If the current signal is complete after this bit, its value is
    /// returned. The accumulator then needs to be [reset][Self::reset] before
    /// bits of the next signal are pushed.
    pub fn push(&mut self, bit: bool) -> Option<Bits> {
        let width = self.bits.len();
        let pos = match self.order {
            BitOrder::MsbFirst => self.collected,
            BitOrder::LsbFirst => width - self.collected - 1,
        };
        self.bits[pos] = bit;
        self.collected += 1;
        if self.collected < width {
            return None;
        }
        self.collected = 0;
        Some(Bits(core::mem::take(&mut self.bits)))
    }
}
