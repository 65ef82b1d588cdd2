// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Software model of the recorder
//!
//! This module provides the [`Recorder`], a [`Channel`] behaving like the
//! register interface of the recorder on the device. It allows exercising the
//! complete dump without hardware, e.g. for replaying captured traces or for
//! testing. Faults may be injected in order to provoke the protocol errors a
//! misbehaving device would cause.
//!
//! # Example
//!
//! ```
//! use scope_dump::channel::Offsets;
//! use scope_dump::config::{Signal, SignalTable};
//! use scope_dump::sim::Recorder;
//!
//! let table = SignalTable::try_from(vec![Signal::new("data", 8.try_into().unwrap())]).unwrap();
//! let offsets = Offsets { command: 0x00, response: 0x08 };
//! let mut recorder = Recorder::new(offsets, &table).with_offset(4);
//! recorder.push_frame(1, &["10100101".parse().unwrap()]).unwrap();
//! recorder.push_frame(3, &["00000001".parse().unwrap()]).unwrap();
//! assert_eq!(recorder.max_frames(), 2);
//! ```

use core::fmt;

use crate::channel::{Channel, Offsets};
use crate::config::{BitOrder, SignalTable};
use crate::decoder::Bits;
use crate::encoder::{self, Encoder};
use crate::protocol::Command;

/// Faults a [`Recorder`] may be instructed to exhibit
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Keep reporting trace data after all of it was read
    StaysValid,
    /// Stop reporting trace data as soon as streaming started
    ClearsEarly,
}

/// Software model of the recorder's register interface
#[derive(Clone, Debug)]
pub struct Recorder {
    offsets: Offsets,
    table: SignalTable,
    order: BitOrder,
    stream: Vec<u64>,
    pos: usize,
    frame_width: u64,
    max_frames: u64,
    offset: u64,
    polls_until_ready: usize,
    fault: Option<Fault>,
    streaming: bool,
    started: bool,
    response: Option<u64>,
    commands: Vec<Command>,
}

impl Recorder {
    /// Create a recorder without any frames for the given signals
    pub fn new(offsets: Offsets, table: &SignalTable) -> Self {
        Self {
            offsets,
            table: table.clone(),
            order: Default::default(),
            stream: Vec::new(),
            pos: 0,
            frame_width: table.frame_width(),
            max_frames: 0,
            offset: 0,
            polls_until_ready: 0,
            fault: None,
            streaming: false,
            started: false,
            response: None,
            commands: Vec::new(),
        }
    }

    /// Set the [`BitOrder`] used for frames pushed afterwards
    pub fn with_bit_order(self, order: BitOrder) -> Self {
        Self { order, ..self }
    }

    /// Set the offset of the first frame in half clock periods
    pub fn with_offset(self, offset: u64) -> Self {
        Self { offset, ..self }
    }

    /// Report the given frame width instead of the signal table's
    pub fn with_reported_width(self, frame_width: u64) -> Self {
        Self {
            frame_width,
            ..self
        }
    }

    /// Report no trace data for the given number of polls
    pub fn with_ready_after(self, polls: usize) -> Self {
        Self {
            polls_until_ready: polls,
            ..self
        }
    }

    /// Exhibit the given [`Fault`]
    pub fn with_fault(self, fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..self
        }
    }

    /// Record a frame
    ///
    /// The values need to be supplied in declaration order.
    pub fn push_frame(&mut self, delta: u64, values: &[Bits]) -> Result<(), encoder::Error> {
        Encoder::new(&self.table)
            .with_bit_order(self.order)
            .encode_frame(delta, values, &mut self.stream)?;
        self.max_frames += 1;
        Ok(())
    }

    /// Drop the given number of words from the end of the recorded stream
    pub fn truncate(&mut self, words: usize) {
        self.stream.truncate(self.stream.len().saturating_sub(words));
    }

    /// Retrieve the number of frames recorded
    pub fn max_frames(&self) -> u64 {
        self.max_frames
    }

    /// Retrieve the number of stream words not read yet
    pub fn words_left(&self) -> usize {
        self.stream.len() - self.pos
    }

    /// Retrieve all commands received so far
    pub fn commands(&self) -> &[Command] {
        self.commands.as_ref()
    }

    /// Retrieve the start delay armed last, if any
    pub fn start_delay(&self) -> Option<u64> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetDelay(d) => Some(*d),
            _ => None,
        })
    }

    /// Retrieve the stop delay armed last, if any
    pub fn stop_delay(&self) -> Option<u64> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetStop(d) => Some(*d),
            _ => None,
        })
    }

    /// Determine the current value of the validity flag
    fn valid(&self) -> bool {
        match self.fault {
            Some(Fault::StaysValid) => true,
            Some(Fault::ClearsEarly) if self.started => false,
            _ => self.pos < self.stream.len(),
        }
    }
}

impl Channel for Recorder {
    type Error = Error;

    fn write64(&mut self, offset: u64, value: u64) -> Result<(), Self::Error> {
        if offset != self.offsets.command {
            return Err(Error::BadOffset(offset));
        }
        let command = Command::decode(value).map_err(Error::UnknownOpcode)?;
        self.commands.push(command);

        self.streaming = false;
        self.response = match command {
            Command::GetValid if self.polls_until_ready > 0 => {
                self.polls_until_ready -= 1;
                Some(0)
            }
            Command::GetValid => Some(self.valid().into()),
            Command::GetWidth => Some(self.frame_width),
            Command::GetCount => Some(self.max_frames),
            Command::GetOffset => Some(self.offset),
            Command::GetData => {
                self.streaming = true;
                self.started = true;
                None
            }
            Command::SetDelay(_) | Command::SetStop(_) => None,
        };
        Ok(())
    }

    fn read64(&mut self, offset: u64) -> Result<u64, Self::Error> {
        if offset != self.offsets.response {
            return Err(Error::BadOffset(offset));
        }
        if self.streaming {
            let word = self.stream.get(self.pos).copied().ok_or(Error::Exhausted {
                consumed: self.pos,
            })?;
            self.pos += 1;
            Ok(word)
        } else {
            self.response.ok_or(Error::NoResponse)
        }
    }
}

/// Errors reported by a [`Recorder`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A register at an unknown offset was accessed
    BadOffset(u64),
    /// A command with an unknown opcode was written
    UnknownOpcode(u8),
    /// The response register was read without a preceding query
    NoResponse,
    /// The stream was read past its end
    Exhausted { consumed: usize },
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadOffset(o) => write!(f, "no register at offset {o:#x}"),
            Self::UnknownOpcode(o) => write!(f, "unknown opcode {o}"),
            Self::NoResponse => write!(f, "no response available"),
            Self::Exhausted { consumed } => {
                write!(f, "stream exhausted after {consumed} words")
            }
        }
    }
}
