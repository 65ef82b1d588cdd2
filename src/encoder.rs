// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Frame encoder
//!
//! This module provides the [`Encoder`], which packs signal values into trace
//! words exactly the way the recorder does and the
//! [`Decoder`][crate::decoder::Decoder] expects. It is used by the
//! [software recorder][crate::sim::Recorder] and may be used for producing
//! synthetic traces.

use core::fmt;

use either::Either;

use crate::config::{BitOrder, SignalTable};
use crate::decoder::{Bits, WORD_BITS};

/// Encoder packing frames into trace words
#[derive(Copy, Clone, Debug)]
pub struct Encoder<'t> {
    table: &'t SignalTable,
    order: BitOrder,
}

impl<'t> Encoder<'t> {
    /// Create a new encoder for the given [`SignalTable`]
    pub fn new(table: &'t SignalTable) -> Self {
        Self {
            table,
            order: Default::default(),
        }
    }

    /// Set the [`BitOrder`] used for placing bits within signals
    pub fn with_bit_order(self, order: BitOrder) -> Self {
        Self { order, ..self }
    }

    /// Retrieve the number of words occupied by a single frame body
    pub fn body_words(&self) -> usize {
        self.table.frame_width().div_ceil(WORD_BITS) as usize
    }

    /// Encode a single frame, consisting of a delta and a body
    ///
    /// The values need to be supplied in declaration order, i.e. in the order
    /// of the signals in the [`SignalTable`]. The words are appended to `out`.
    pub fn encode_frame(&self, delta: u64, values: &[Bits], out: &mut Vec<u64>) -> Result<(), Error> {
        if values.len() != self.table.len() {
            return Err(Error::SignalCount {
                expected: self.table.len(),
                got: values.len(),
            });
        }
        for (i, (signal, value)) in self.table.iter().zip(values).enumerate() {
            let expected = signal.width.get() as usize;
            if value.len() != expected {
                return Err(Error::Width {
                    id: i + 1,
                    expected,
                    got: value.len(),
                });
            }
        }

        out.push(delta);
        let start = out.len();
        out.resize(start + self.body_words(), 0);
        let body = &mut out[start..];

        let bits = values.iter().rev().flat_map(|v| {
            let bits = v.as_slice().iter().copied();
            match self.order {
                BitOrder::MsbFirst => Either::Left(bits),
                BitOrder::LsbFirst => Either::Right(bits.rev()),
            }
        });
        for (pos, bit) in bits.enumerate() {
            if bit {
                body[pos / WORD_BITS as usize] |= 1 << (pos as u64 % WORD_BITS);
            }
        }
        Ok(())
    }
}

/// Frame encoding errors
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The number of values does not match the number of signals
    SignalCount { expected: usize, got: usize },
    /// The width of a value does not match its signal's width
    Width { id: usize, expected: usize, got: usize },
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignalCount { expected, got } => {
                write!(f, "expected values for {expected} signals, got {got}")
            }
            Self::Width { id, expected, got } => {
                write!(f, "signal {id} is {expected} bits wide, got {got} bits")
            }
        }
    }
}
