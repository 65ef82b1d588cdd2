// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Configuration and utilities
//!
//! The recorder on the device samples a fixed set of signals. The host needs
//! to know these signals, in their declared order, in order to make sense of
//! the trace data. This module defines the [`SignalTable`] holding them as
//! well as the remaining knobs of a dump, bundled in a [`Config`].
//!
//! With the `toml` feature enabled, a [`Config`] may be loaded from a TOML
//! document such as the following:
//!
//! ```toml
//! bit-order = "msb-first"
//!
//! [channel]
//! command = 0x0a0
//! response = 0x0a8
//!
//! [poll]
//! interval = 1000
//! timeout = 60000
//!
//! [waveform]
//! output = "scope.vcd"
//!
//! [[signal]]
//! name = "valid"
//! width = 1
//!
//! [[signal]]
//! name = "pc"
//! width = 32
//! ```

#[cfg(feature = "serde")]
mod serde_utils;

#[cfg(test)]
mod tests;

use core::fmt;
use core::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use crate::channel::Offsets;

/// A single signal sampled by the recorder
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub name: String,
    pub width: NonZeroU32,
}

impl Signal {
    /// Create a new signal
    pub fn new(name: impl Into<String>, width: NonZeroU32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// Ordered list of the signals sampled by the recorder
///
/// The order of the signals is significant: it defines both the identifier of
/// each signal in the waveform (starting at `1` for the first signal) and the
/// layout of the signals within a frame. A table is never empty, contains no
/// duplicate names and no names a waveform viewer could not parse.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Signal>", into = "Vec<Signal>")
)]
pub struct SignalTable {
    signals: Vec<Signal>,
    frame_width: u64,
}

impl SignalTable {
    /// Retrieve the number of signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Always `false`, a [`SignalTable`] always holds at least one signal
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Retrieve the signal with the given (1-based) identifier
    pub fn get(&self, id: usize) -> Option<&Signal> {
        id.checked_sub(1).and_then(|i| self.signals.get(i))
    }

    /// Iterate over all signals in declaration order
    pub fn iter(&self) -> core::slice::Iter<'_, Signal> {
        self.signals.iter()
    }

    /// Retrieve the width of a single frame in bits
    ///
    /// This is the sum of all signal widths.
    pub fn frame_width(&self) -> u64 {
        self.frame_width
    }
}

impl TryFrom<Vec<Signal>> for SignalTable {
    type Error = Error;

    fn try_from(signals: Vec<Signal>) -> Result<Self, Self::Error> {
        if signals.is_empty() {
            return Err(Error::NoSignals);
        }

        for (i, signal) in signals.iter().enumerate() {
            let valid = !signal.name.is_empty()
                && signal.name.chars().all(|c| c.is_ascii_graphic() && c != '$');
            if !valid {
                return Err(Error::InvalidName(signal.name.clone()));
            }
            if signals[..i].iter().any(|s| s.name == signal.name) {
                return Err(Error::DuplicateName(signal.name.clone()));
            }
        }

        let frame_width = signals.iter().map(|s| u64::from(s.width.get())).sum();
        Ok(Self {
            signals,
            frame_width,
        })
    }
}

impl From<SignalTable> for Vec<Signal> {
    fn from(table: SignalTable) -> Self {
        table.signals
    }
}

impl<'a> IntoIterator for &'a SignalTable {
    type Item = &'a Signal;
    type IntoIter = core::slice::Iter<'a, Signal>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Placement of the bits of a single signal
///
/// Bits are always consumed from the least significant bit of each trace word
/// upwards. This setting controls where within a signal each consumed bit
/// lands.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum BitOrder {
    /// The first bit consumed is the signal's most significant bit
    #[default]
    MsbFirst,
    /// The first bit consumed is the signal's least significant bit
    ///
    /// This corresponds to a frame being the plain concatenation of all
    /// signals, with the last declared signal occupying the lowest bits.
    LsbFirst,
}

/// Readiness polling behaviour
///
/// By default, the device is polled once every second, indefinitely.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Poll {
    /// Time to wait between two polls, in milliseconds in serialized form
    #[cfg_attr(feature = "serde", serde(with = "serde_utils::Millis"))]
    pub interval: Duration,
    /// Give up after this time has elapsed, in milliseconds in serialized form
    #[cfg_attr(feature = "serde", serde(with = "serde_utils::MaybeMillis"))]
    pub timeout: Option<Duration>,
}

impl Default for Poll {
    fn default() -> Self {
        POLL
    }
}

/// Default [`Poll`] settings
pub const POLL: Poll = Poll {
    interval: Duration::from_secs(1),
    timeout: None,
};

/// Waveform output settings
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Waveform {
    /// Path of the waveform file written by [`stop`][crate::stop]
    pub output: PathBuf,
    /// Text placed in the `$version` section
    pub version: String,
    /// Duration of a single timestamp unit, in nanoseconds
    pub timescale: u32,
}

impl Default for Waveform {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            version: String::from(DEFAULT_VERSION),
            timescale: 1,
        }
    }
}

/// Default name of the waveform file
pub const DEFAULT_OUTPUT: &str = "scope.vcd";

/// Default `$version` text of the waveform file
pub const DEFAULT_VERSION: &str = "Generated by scope-dump";

/// Configuration of a dump
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub struct Config {
    #[cfg_attr(feature = "serde", serde(rename = "signal"))]
    pub signals: SignalTable,
    pub channel: Offsets,
    #[cfg_attr(feature = "serde", serde(default))]
    pub poll: Poll,
    #[cfg_attr(feature = "serde", serde(default))]
    pub waveform: Waveform,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bit_order: BitOrder,
}

impl Config {
    /// Create a configuration with default settings for the given signals
    pub fn new(signals: SignalTable, channel: Offsets) -> Self {
        Self {
            signals,
            channel,
            poll: Default::default(),
            waveform: Default::default(),
            bit_order: Default::default(),
        }
    }

    /// Parse a configuration from a TOML document
    #[cfg(feature = "toml")]
    pub fn from_toml(document: &str) -> Result<Self, Error> {
        toml::from_str(document).map_err(Error::Parse)
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum Error {
    /// The signal table does not contain a single signal
    NoSignals,
    /// A signal name appears more than once
    DuplicateName(String),
    /// A signal name is empty or contains characters not allowed in waveforms
    InvalidName(String),
    /// The configuration could not be parsed
    #[cfg(feature = "toml")]
    Parse(toml::de::Error),
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            #[cfg(feature = "toml")]
            Self::Parse(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSignals => write!(f, "signal table is empty"),
            Self::DuplicateName(n) => write!(f, "signal \"{n}\" declared more than once"),
            Self::InvalidName(n) => write!(f, "invalid signal name \"{n}\""),
            #[cfg(feature = "toml")]
            Self::Parse(_) => write!(f, "could not parse configuration"),
        }
    }
}
