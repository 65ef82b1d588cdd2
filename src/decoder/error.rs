// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Frame decoding errors

use core::fmt;

/// Errors that may occur while decoding frames
#[derive(Debug, PartialEq, Eq)]
pub enum Error<S> {
    /// The [`Words`][super::Words] source failed to supply a word
    Source(S),
    /// The frame body did not end exactly on the frame width
    Misaligned {
        /// Index of the frame
        frame: u64,
        /// Bit position within the frame body at which the error was detected
        bit: u64,
    },
}

impl<S> core::error::Error for Error<S>
where
    S: fmt::Debug + core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Source(inner) => Some(inner),
            _ => None,
        }
    }
}

impl<S> fmt::Display for Error<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(_) => write!(f, "could not read trace word"),
            Self::Misaligned { frame, bit } => {
                write!(f, "frame {frame} desynchronized at bit {bit}")
            }
        }
    }
}

/// The trace ended before all frames were decoded
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EndOfTrace {
    /// Number of words consumed before the end was hit
    pub consumed: usize,
}

impl core::error::Error for EndOfTrace {}

impl fmt::Display for EndOfTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace ended unexpectedly after {} words", self.consumed)
    }
}
