// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Memory mapped register blocks

use core::fmt;
use core::ptr::NonNull;

use super::Channel;

/// [`Channel`] for a register block mapped into the address space
///
/// All accesses are performed as volatile 64-bit loads and stores relative to
/// the base of the block.
#[derive(Debug)]
pub struct Mmio {
    base: NonNull<u8>,
    len: usize,
}

impl Mmio {
    /// Create a channel for the register block at `base` spanning `len` bytes
    ///
    /// # Safety
    ///
    /// `base` must point to a mapping of at least `len` bytes that is valid
    /// for volatile reads and writes and aligned to 8 bytes for as long as the
    /// returned value is used. No other code may access the block in the
    /// meantime.
    pub unsafe fn new(base: NonNull<u8>, len: usize) -> Self {
        Self { base, len }
    }

    /// Retrieve the pointer to the register at the given offset
    fn register(&self, offset: u64) -> Result<NonNull<u64>, Error> {
        let offset = usize::try_from(offset).map_err(|_| Error::OutOfRange(offset))?;
        if offset % 8 != 0 {
            return Err(Error::Misaligned(offset));
        }
        if offset.checked_add(8).is_none_or(|end| end > self.len) {
            return Err(Error::OutOfRange(offset as u64));
        }
        // SAFETY: the offset is within the block as checked above
        Ok(unsafe { self.base.add(offset) }.cast())
    }
}

impl Channel for Mmio {
    type Error = Error;

    fn write64(&mut self, offset: u64, value: u64) -> Result<(), Self::Error> {
        let register = self.register(offset)?;
        // SAFETY: validity and alignment are guaranteed by the creator
        unsafe { register.write_volatile(value) };
        Ok(())
    }

    fn read64(&mut self, offset: u64) -> Result<u64, Self::Error> {
        let register = self.register(offset)?;
        // SAFETY: validity and alignment are guaranteed by the creator
        Ok(unsafe { register.read_volatile() })
    }
}

/// Errors for [`Mmio`] register accesses
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The offset is not aligned to 8 bytes
    Misaligned(usize),
    /// The register lies outside the mapped block
    OutOfRange(u64),
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misaligned(o) => write!(f, "register offset {o:#x} is not 64-bit aligned"),
            Self::OutOfRange(o) => write!(f, "register offset {o:#x} is outside the block"),
        }
    }
}
