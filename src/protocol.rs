// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Command protocol
//!
//! The recorder understands a small set of [`Command`]s, each written as a
//! single word to the command register. Commands querying information are
//! followed by a read of the response register. Together, the write and the
//! read form one exchange which must not be interleaved with other commands.
//!
//! The [`Client`] drives these exchanges. It tracks the recorder's state
//! explicitly as a [`State`], since the device's read cursor is stateful:
//! after [`Command::GetData`], every read of the response register yields the
//! next word of the trace and any stray command would desynchronize host and
//! device.

pub mod error;


use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::channel::{Channel, Offsets};
use crate::config::{Poll, SignalTable};
use crate::decoder::Words;

pub use error::Error;

use error::Access;

/// Number of bits occupied by the opcode in a command word
pub const OPCODE_BITS: u32 = 3;

/// Largest payload that fits into a command word
pub const MAX_PAYLOAD: u64 = u64::MAX >> OPCODE_BITS;

/// A command understood by the recorder
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Query whether trace data is available
    GetValid,
    /// Switch to streaming the trace data
    GetData,
    /// Query the width of a frame in bits
    GetWidth,
    /// Query the number of frames recorded
    GetCount,
    /// Delay the start of the recording by the given number of cycles
    SetDelay(u64),
    /// Stop the recording after the given number of cycles
    SetStop(u64),
    /// Query the offset of the first frame in half clock periods
    GetOffset,
}

impl Command {
    /// Retrieve the opcode of this command
    pub const fn opcode(self) -> u8 {
        match self {
            Self::GetValid => 0,
            Self::GetData => 1,
            Self::GetWidth => 2,
            Self::GetCount => 3,
            Self::SetDelay(_) => 4,
            Self::SetStop(_) => 5,
            Self::GetOffset => 6,
        }
    }

    /// Retrieve the payload of this command
    pub const fn payload(self) -> u64 {
        match self {
            Self::SetDelay(p) | Self::SetStop(p) => p,
            _ => 0,
        }
    }

    /// Determine whether the recorder answers this command via the response
    /// register
    pub const fn has_response(self) -> bool {
        !matches!(self, Self::SetDelay(_) | Self::SetStop(_))
    }

    /// Encode this command as a command word
    ///
    /// Returns [`None`] if the payload exceeds [`MAX_PAYLOAD`].
    pub const fn encode(self) -> Option<u64> {
        let payload = self.payload();
        if payload > MAX_PAYLOAD {
            None
        } else {
            Some((payload << OPCODE_BITS) | self.opcode() as u64)
        }
    }

    /// Decode a command word
    ///
    /// Returns the unknown opcode if the word does not denote a command. The
    /// payload of commands that do not take one is ignored.
    pub const fn decode(word: u64) -> Result<Self, u8> {
        let payload = word >> OPCODE_BITS;
        match (word & ((1 << OPCODE_BITS) - 1)) as u8 {
            0 => Ok(Self::GetValid),
            1 => Ok(Self::GetData),
            2 => Ok(Self::GetWidth),
            3 => Ok(Self::GetCount),
            4 => Ok(Self::SetDelay(payload)),
            5 => Ok(Self::SetStop(payload)),
            6 => Ok(Self::GetOffset),
            op => Err(op),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetValid => write!(f, "GET_VALID"),
            Self::GetData => write!(f, "GET_DATA"),
            Self::GetWidth => write!(f, "GET_WIDTH"),
            Self::GetCount => write!(f, "GET_COUNT"),
            Self::SetDelay(d) => write!(f, "SET_DELAY({d})"),
            Self::SetStop(d) => write!(f, "SET_STOP({d})"),
            Self::GetOffset => write!(f, "GET_OFFSET"),
        }
    }
}

/// Static information about a recorded trace
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    /// Width of a single frame in bits
    pub frame_width: u64,
    /// Number of frames recorded
    pub max_frames: u64,
    /// Offset of the first frame in half clock periods
    pub offset: u64,
}

impl Metadata {
    /// Check this metadata against a [`SignalTable`]
    ///
    /// The reported frame width must match the table's and at least one frame
    /// must have been recorded.
    pub fn validate<E>(&self, table: &SignalTable) -> Result<(), Error<E>> {
        let expected = table.frame_width();
        if self.frame_width != expected {
            return Err(Error::WidthMismatch {
                expected,
                reported: self.frame_width,
            });
        }
        if self.max_frames == 0 {
            return Err(Error::NoFrames);
        }
        Ok(())
    }
}

/// State of a [`Client`]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// No trace data was announced yet
    Idle,
    /// Waiting for the recorder to announce trace data
    AwaitingReady,
    /// The recorder announced trace data
    Ready,
    /// The recorder streams trace data
    Streaming {
        /// Number of words read since the stream started
        words: u64,
        /// Whether the stream was already re-triggered
        retriggered: bool,
    },
}

/// Token for cancelling a [`Client::wait_until_ready`] from elsewhere
///
/// Clones of a token share their state.
#[derive(Clone, Debug, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    /// Create a new, uncancelled token
    pub fn new() -> Self {
        Default::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Client driving the recorder via a [`Channel`]
///
/// The client owns the channel for the duration of its existence. Commands
/// are checked against the client's [`State`]. In particular, no command may
/// be issued while trace data is streamed except for the
/// [re-trigger][Self::retrigger] preceding the last frame.
#[derive(Debug)]
pub struct Client<C> {
    channel: C,
    offsets: Offsets,
    state: State,
}

impl<C: Channel> Client<C> {
    /// Create a new client for the registers at the given `offsets`
    pub fn new(channel: C, offsets: Offsets) -> Self {
        Self {
            channel,
            offsets,
            state: State::Idle,
        }
    }

    /// Retrieve the current [`State`]
    pub fn state(&self) -> State {
        self.state
    }

    /// Retrieve the inner [`Channel`]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Release the inner [`Channel`]
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Arm a start delay
    ///
    /// If `delay` is [`None`], no command is issued.
    pub fn start(&mut self, delay: Option<u64>) -> Result<(), Error<C::Error>> {
        if let Some(delay) = delay {
            self.issue(Command::SetDelay(delay))?;
            log::info!("scope start delay: {delay}");
        }
        Ok(())
    }

    /// Arm a stop delay
    ///
    /// If `delay` is [`None`], no command is issued.
    pub fn stop(&mut self, delay: Option<u64>) -> Result<(), Error<C::Error>> {
        if let Some(delay) = delay {
            self.issue(Command::SetStop(delay))?;
            log::info!("scope stop delay: {delay}");
        }
        Ok(())
    }

    /// Query whether the recorder has trace data available
    ///
    /// This query is rejected while trace data is streamed.
    pub fn is_valid(&mut self) -> Result<bool, Error<C::Error>> {
        self.exchange(Command::GetValid).map(|v| v != 0)
    }

    /// Block until the recorder announces trace data
    ///
    /// The recorder is polled once every [`Poll::interval`]. Without a
    /// [`Poll::timeout`] and `cancel` token, this fn blocks until the
    /// recorder becomes ready, however long that takes.
    pub fn wait_until_ready(
        &mut self,
        poll: &Poll,
        cancel: Option<&Cancel>,
    ) -> Result<(), Error<C::Error>> {
        self.expect_idle()?;
        self.state = State::AwaitingReady;
        let res = self.poll_ready(poll, cancel);
        self.state = if res.is_ok() {
            State::Ready
        } else {
            State::Idle
        };
        res
    }

    /// Read the trace's [`Metadata`]
    ///
    /// The recorder must have announced trace data before.
    pub fn read_metadata(&mut self) -> Result<Metadata, Error<C::Error>> {
        self.expect_ready()?;
        let frame_width = self.exchange(Command::GetWidth)?;
        log::info!("scope::frame_width={frame_width}");
        let max_frames = self.exchange(Command::GetCount)?;
        log::info!("scope::max_frames={max_frames}");
        let offset = self.exchange(Command::GetOffset)?;
        log::debug!("scope::offset={offset}");
        Ok(Metadata {
            frame_width,
            max_frames,
            offset,
        })
    }

    /// Switch the recorder to streaming trace data
    ///
    /// Afterwards, trace words are retrieved via the client's [`Words`]
    /// implementation.
    pub fn begin_data_stream(&mut self) -> Result<(), Error<C::Error>> {
        self.expect_ready()?;
        self.issue(Command::GetData)?;
        self.state = State::Streaming {
            words: 0,
            retriggered: false,
        };
        Ok(())
    }

    /// Re-trigger the stream for the last frame
    ///
    /// The recorder requires the stream to be re-triggered before the last
    /// frame's body. The recorder must still report trace data at this point.
    /// A stream may only be re-triggered once.
    pub fn retrigger(&mut self) -> Result<(), Error<C::Error>> {
        let State::Streaming {
            words,
            retriggered: false,
        } = self.state
        else {
            return Err(Error::InvalidState(self.state));
        };
        if self.transfer(Command::GetValid)? == 0 {
            return Err(Error::NotReady);
        }
        self.send(Command::GetData)?;
        self.state = State::Streaming {
            words,
            retriggered: true,
        };
        log::trace!("re-triggered stream after {words} words");
        Ok(())
    }

    /// Leave streaming mode after all frames were read
    ///
    /// The recorder must no longer report trace data at this point.
    pub fn end_data_stream(&mut self) -> Result<(), Error<C::Error>> {
        if !matches!(self.state, State::Streaming { .. }) {
            return Err(Error::InvalidState(self.state));
        }
        self.state = State::Idle;
        match self.exchange(Command::GetValid)? {
            0 => Ok(()),
            v => Err(Error::StillValid(v)),
        }
    }

    /// Read the next trace word
    fn read_word(&mut self) -> Result<u64, Error<C::Error>> {
        let State::Streaming { words, retriggered } = self.state else {
            return Err(Error::InvalidState(self.state));
        };
        let word = self
            .channel
            .read64(self.offsets.response)
            .map_err(|e| Error::Channel(Access::Read(Command::GetData), e))?;
        log::trace!("word {words}: {word:#018x}");
        self.state = State::Streaming {
            words: words + 1,
            retriggered,
        };
        Ok(word)
    }

    /// Poll until the recorder reports trace data
    fn poll_ready(&mut self, poll: &Poll, cancel: Option<&Cancel>) -> Result<(), Error<C::Error>> {
        let started = Instant::now();
        loop {
            if self.is_valid()? {
                return Ok(());
            }
            if cancel.is_some_and(Cancel::is_cancelled) {
                return Err(Error::Cancelled);
            }
            if poll.timeout.is_some_and(|t| started.elapsed() >= t) {
                return Err(Error::Timeout);
            }
            std::thread::sleep(poll.interval);
        }
    }

    /// Issue a command without reading a response
    fn issue(&mut self, command: Command) -> Result<(), Error<C::Error>> {
        self.expect_not_streaming()?;
        self.send(command)
    }

    /// Issue a command and read its response
    fn exchange(&mut self, command: Command) -> Result<u64, Error<C::Error>> {
        self.expect_not_streaming()?;
        self.transfer(command)
    }

    /// Write a command regardless of the current [`State`]
    fn send(&mut self, command: Command) -> Result<(), Error<C::Error>> {
        let word = command
            .encode()
            .ok_or(Error::PayloadTooLarge(command.payload()))?;
        self.channel
            .write64(self.offsets.command, word)
            .map_err(|e| Error::Channel(Access::Write(command), e))
    }

    /// Write a command and read its response regardless of the current [`State`]
    fn transfer(&mut self, command: Command) -> Result<u64, Error<C::Error>> {
        self.send(command)?;
        self.channel
            .read64(self.offsets.response)
            .map_err(|e| Error::Channel(Access::Read(command), e))
    }

    fn expect_not_streaming(&self) -> Result<(), Error<C::Error>> {
        match self.state {
            s @ State::Streaming { .. } => Err(Error::InvalidState(s)),
            _ => Ok(()),
        }
    }

    fn expect_idle(&self) -> Result<(), Error<C::Error>> {
        match self.state {
            State::Idle | State::Ready => Ok(()),
            s => Err(Error::InvalidState(s)),
        }
    }

    fn expect_ready(&self) -> Result<(), Error<C::Error>> {
        match self.state {
            State::Ready => Ok(()),
            s => Err(Error::InvalidState(s)),
        }
    }
}

impl<C: Channel> Words for Client<C> {
    type Error = Error<C::Error>;

    fn next_word(&mut self) -> Result<u64, Self::Error> {
        self.read_word()
    }

    fn restart(&mut self) -> Result<(), Self::Error> {
        self.retrigger()
    }
}
