// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Protocol errors

use core::fmt;

use super::{Command, State};

/// The part of a register exchange that failed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    /// Writing the given command
    Write(Command),
    /// Reading the response to the given command
    Read(Command),
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(c) => write!(f, "writing command {c}"),
            Self::Read(c) => write!(f, "reading response to {c}"),
        }
    }
}

/// Errors that may occur while talking to the recorder
#[derive(Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// A register access failed
    Channel(Access, E),
    /// A command payload does not fit into a command word
    PayloadTooLarge(u64),
    /// A command was issued while the client was in an unsuitable state
    InvalidState(State),
    /// The frame width reported by the device differs from the signal table
    WidthMismatch { expected: u64, reported: u64 },
    /// The recorder reported trace data but no frames
    NoFrames,
    /// The recorder reported no data before the last frame
    NotReady,
    /// The recorder still reports data after all frames were drained
    StillValid(u64),
    /// The recorder did not become ready within the configured timeout
    Timeout,
    /// Waiting for the recorder was cancelled
    Cancelled,
}

impl<E> core::error::Error for Error<E>
where
    E: fmt::Debug + core::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Channel(_, inner) => Some(inner),
            _ => None,
        }
    }
}

impl<E> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(access, _) => write!(f, "register access failed while {access}"),
            Self::PayloadTooLarge(p) => write!(f, "payload {p} does not fit into a command"),
            Self::InvalidState(s) => write!(f, "command not allowed in state {s:?}"),
            Self::WidthMismatch { expected, reported } => write!(
                f,
                "invalid frame width {reported}, expecting {expected} from the signal table"
            ),
            Self::NoFrames => write!(f, "recorder reported an empty trace"),
            Self::NotReady => write!(f, "recorder has no data for the last frame"),
            Self::StillValid(v) => write!(f, "recorder still reports data ({v}) after dump"),
            Self::Timeout => write!(f, "timed out waiting for the recorder"),
            Self::Cancelled => write!(f, "cancelled while waiting for the recorder"),
        }
    }
}
