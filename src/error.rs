// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Crate level errors and status codes

use core::fmt;
use std::io;

use crate::{decoder, protocol};

/// Status reported for a successful operation
pub const STATUS_OK: i32 = 0;
/// Status reported if no device was supplied
pub const STATUS_NO_DEVICE: i32 = -1;
/// Status reported if a register access failed
pub const STATUS_CHANNEL: i32 = -2;
/// Status reported if the recorder's metadata does not match the signal table
pub const STATUS_METADATA: i32 = -3;
/// Status reported if the trace could not be decoded
pub const STATUS_DESYNC: i32 = -4;
/// Status reported if the recorder's validity flag was not as expected
pub const STATUS_VALIDITY: i32 = -5;
/// Status reported if the recorder did not become ready in time
pub const STATUS_TIMEOUT: i32 = -6;
/// Status reported if waiting for the recorder was cancelled
pub const STATUS_CANCELLED: i32 = -7;
/// Status reported if the waveform could not be written
pub const STATUS_IO: i32 = -8;
/// Status reported for commands rejected before reaching the recorder
pub const STATUS_USAGE: i32 = -9;

/// Errors that may occur during [`start`][crate::start] or
/// [`stop`][crate::stop]
#[derive(Debug)]
pub enum Error<E> {
    /// No device handle was supplied
    NoDevice,
    /// Talking to the recorder failed
    Protocol(protocol::Error<E>),
    /// A frame body did not end exactly on the frame width
    Misaligned { frame: u64, bit: u64 },
    /// Writing the waveform failed
    Io(io::Error),
}

impl<E> Error<E> {
    /// Retrieve the negative status code corresponding to this error
    pub fn status(&self) -> i32 {
        use protocol::Error as P;

        match self {
            Self::NoDevice => STATUS_NO_DEVICE,
            Self::Protocol(P::Channel(..)) => STATUS_CHANNEL,
            Self::Protocol(P::WidthMismatch { .. } | P::NoFrames) => STATUS_METADATA,
            Self::Protocol(P::NotReady | P::StillValid(_)) => STATUS_VALIDITY,
            Self::Protocol(P::Timeout) => STATUS_TIMEOUT,
            Self::Protocol(P::Cancelled) => STATUS_CANCELLED,
            Self::Protocol(P::PayloadTooLarge(_) | P::InvalidState(_)) => STATUS_USAGE,
            Self::Misaligned { .. } => STATUS_DESYNC,
            Self::Io(_) => STATUS_IO,
        }
    }
}

/// Map the result of an operation to a status code
///
/// Success maps to [`STATUS_OK`], errors to their [`Error::status`].
pub fn status<T, E>(result: &Result<T, Error<E>>) -> i32 {
    result.as_ref().map_or_else(Error::status, |_| STATUS_OK)
}

impl<E> From<protocol::Error<E>> for Error<E> {
    fn from(e: protocol::Error<E>) -> Self {
        Self::Protocol(e)
    }
}

impl<E> From<decoder::Error<protocol::Error<E>>> for Error<E> {
    fn from(e: decoder::Error<protocol::Error<E>>) -> Self {
        match e {
            decoder::Error::Source(inner) => Self::Protocol(inner),
            decoder::Error::Misaligned { frame, bit } => Self::Misaligned { frame, bit },
        }
    }
}

impl<E> From<io::Error> for Error<E> {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl<E> core::error::Error for Error<E>
where
    E: fmt::Debug + core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Protocol(inner) => Some(inner),
            Self::Io(inner) => Some(inner),
            _ => None,
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice => write!(f, "no device supplied"),
            Self::Protocol(_) => write!(f, "recorder protocol failure"),
            Self::Misaligned { frame, bit } => {
                write!(f, "frame {frame} desynchronized at bit {bit}")
            }
            Self::Io(_) => write!(f, "could not write waveform"),
        }
    }
}
