// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Register channels
//!
//! The recorder is controlled exclusively through two 64-bit registers: one
//! for writing commands and one for reading responses. This module defines the
//! [`Channel`] trait abstracting access to those registers as well as a few
//! types implementing it:
//!
//! * closure based channels created via [`from_fns`], useful for wrapping the
//!   register access fns of a vendor driver,
//! * [`mmio::Mmio`] for register blocks mapped into the address space and
//! * the software model [`Recorder`][crate::sim::Recorder].
//!
//! # Example
//!
//! ```
//! use scope_dump::channel::{self, Channel};
//!
//! let mut last = 0;
//! let mut chan = channel::from_fns(
//!     |_, value| {
//!         last = value;
//!         Ok::<_, core::convert::Infallible>(())
//!     },
//!     |_| Ok(0),
//! );
//! chan.write64(0x10, 2).unwrap();
//! assert_eq!(chan.read64(0x18), Ok(0));
//! ```

pub mod mmio;


/// Synchronous access to 64-bit registers
pub trait Channel {
    /// Error type returned by register accesses
    type Error;

    /// Write `value` to the register at the given byte `offset`
    fn write64(&mut self, offset: u64, value: u64) -> Result<(), Self::Error>;

    /// Read the register at the given byte `offset`
    fn read64(&mut self, offset: u64) -> Result<u64, Self::Error>;
}

impl<C: Channel + ?Sized> Channel for &mut C {
    type Error = C::Error;

    fn write64(&mut self, offset: u64, value: u64) -> Result<(), Self::Error> {
        C::write64(self, offset, value)
    }

    fn read64(&mut self, offset: u64) -> Result<u64, Self::Error> {
        C::read64(self, offset)
    }
}

/// Byte offsets of the command and response registers
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offsets {
    /// Offset of the register commands are written to
    pub command: u64,
    /// Offset of the register responses are read from
    pub response: u64,
}

impl Offsets {
    /// Create offsets from register indices in units of 32-bit words
    ///
    /// Register maps frequently list register positions as indices of 32-bit
    /// words rather than as byte offsets.
    pub const fn from_dword_indices(command: u64, response: u64) -> Self {
        Self {
            command: command * 4,
            response: response * 4,
        }
    }
}

/// Create a [`Channel`] from a pair of fns
///
/// The first fn will be called for register writes, the second for register
/// reads.
pub fn from_fns<W, R, E>(write: W, read: R) -> FromFns<W, R>
where
    W: FnMut(u64, u64) -> Result<(), E>,
    R: FnMut(u64) -> Result<u64, E>,
{
    FromFns { write, read }
}

/// [`Channel`] calling fns for register accesses
///
/// Create via [`from_fns`].
#[derive(Copy, Clone, Debug)]
pub struct FromFns<W, R> {
    write: W,
    read: R,
}

impl<W, R, E> Channel for FromFns<W, R>
where
    W: FnMut(u64, u64) -> Result<(), E>,
    R: FnMut(u64) -> Result<u64, E>,
{
    type Error = E;

    fn write64(&mut self, offset: u64, value: u64) -> Result<(), Self::Error> {
        (self.write)(offset, value)
    }

    fn read64(&mut self, offset: u64) -> Result<u64, Self::Error> {
        (self.read)(offset)
    }
}
