// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Implements the frame decoder
//!
//! The recorder emits its trace as a stream of 64-bit words. For every frame,
//! the stream contains
//!
//! 1. a single word holding the frame's delta, i.e. the number of half clock
//!    periods elapsed since the previous frame, followed by
//! 2. the frame body: the values of all signals as a contiguous bit-stream of
//!    exactly the frame width, starting at a fresh word.
//!
//! Bits are consumed from each word starting with the least significant bit.
//! The signals are filled in reverse declaration order, i.e. the last
//! declared signal receives the first bits of a frame body. Within a signal,
//! bits are placed according to the configured [`BitOrder`]. Bits following
//! the frame body in the body's last word are padding.
//!
//! The [`Decoder`] turns such a stream, supplied through the [`Words`] trait,
//! into [`Event`]s: one for every delta and one for every signal value.
//!
//! # Example
//!
//! ```
//! use scope_dump::config::{Signal, SignalTable};
//! use scope_dump::decoder::{self, Decoder, Event};
//!
//! let table = SignalTable::try_from(vec![
//!     Signal::new("valid", 1.try_into().unwrap()),
//!     Signal::new("data", 4.try_into().unwrap()),
//! ])
//! .unwrap();
//! let mut words = decoder::from_slice(&[3, 0b1_0110]);
//! let mut decoder = Decoder::new(&table, table.frame_width(), 1);
//! decoder.events(&mut words).for_each(|e| match e.unwrap() {
//!     Event::Delta { frame, delta } => println!("frame {frame}, delta {delta}"),
//!     Event::Sample(s) => println!("b{} {}", s.bits, s.id),
//! });
//! ```

pub mod bits;
pub mod error;

#[cfg(test)]
mod tests;

pub use bits::Bits;
pub use error::Error;

use crate::config::{BitOrder, SignalTable};

use bits::Accumulator;
use error::EndOfTrace;

/// Number of bits in a single trace word
pub const WORD_BITS: u64 = u64::BITS as u64;

/// Source of trace words
pub trait Words {
    /// Error type returned when no word could be supplied
    type Error;

    /// Retrieve the next word of the trace
    fn next_word(&mut self) -> Result<u64, Self::Error>;

    /// Prepare the source for the last frame's body
    ///
    /// This fn is called once per trace, after the last frame's delta was
    /// retrieved and before the first word of that frame's body is. Sources
    /// that do not need any preparation may rely on the default
    /// implementation, which does nothing.
    fn restart(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<W: Words + ?Sized> Words for &mut W {
    type Error = W::Error;

    fn next_word(&mut self) -> Result<u64, Self::Error> {
        W::next_word(self)
    }

    fn restart(&mut self) -> Result<(), Self::Error> {
        W::restart(self)
    }
}

/// Create a [`Words`] source from a slice of words
pub fn from_slice(words: &[u64]) -> Slice<'_> {
    Slice { words, pos: 0 }
}

/// [`Words`] source backed by a slice
///
/// Create via [`from_slice`]. Running past the end of the slice results in an
/// [`EndOfTrace`] error.
#[derive(Clone, Debug)]
pub struct Slice<'a> {
    words: &'a [u64],
    pos: usize,
}

impl Slice<'_> {
    /// Retrieve the number of words left
    pub fn words_left(&self) -> usize {
        self.words.len() - self.pos
    }
}

impl Words for Slice<'_> {
    type Error = EndOfTrace;

    fn next_word(&mut self) -> Result<u64, Self::Error> {
        let word = self.words.get(self.pos).copied().ok_or(EndOfTrace {
            consumed: self.pos,
        })?;
        self.pos += 1;
        Ok(word)
    }
}

/// Something decoded from the trace
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The delta preceding a frame
    Delta {
        /// Index of the frame the delta precedes
        frame: u64,
        /// Number of half clock periods elapsed since the previous frame
        delta: u64,
    },
    /// The value of a signal in the current frame
    Sample(Sample),
}

/// Value of a single signal within a single frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// 1-based identifier of the signal, its position in the [`SignalTable`]
    pub id: usize,
    /// The signal's value
    pub bits: Bits,
}

/// Position of the [`Decoder`] within the trace
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Index of the current frame
    pub frame: u64,
    /// Number of body bits of the current frame consumed so far
    pub bit: u64,
    /// Identifier of the signal currently being filled, `0` if none
    pub signal: usize,
    /// Number of bits collected for the current signal
    pub collected: usize,
}

/// Decoder for a stream of trace words
///
/// The decoder consumes exactly the given number of frames, retrieving words
/// from a [`Words`] source as needed. It never reads ahead: a word is only
/// retrieved once its first bit is needed.
#[derive(Clone, Debug)]
pub struct Decoder<'t> {
    table: &'t SignalTable,
    frame_width: u64,
    max_frames: u64,
    cursor: Cursor,
    phase: Phase,
    word: u64,
    accumulator: Accumulator,
}

impl<'t> Decoder<'t> {
    /// Create a new decoder
    ///
    /// The decoder will decode `max_frames` frames with bodies of
    /// `frame_width` bits each. Signals are placed in accordance to the given
    /// [`SignalTable`]. If the frame width does not match the table, decoding
    /// will fail as soon as the mismatch manifests.
    pub fn new(table: &'t SignalTable, frame_width: u64, max_frames: u64) -> Self {
        let mut res = Self {
            table,
            frame_width,
            max_frames,
            cursor: Default::default(),
            phase: Phase::Delta,
            word: 0,
            accumulator: Accumulator::new(Default::default()),
        };
        res.begin_frame(0);
        res
    }

    /// Set the [`BitOrder`] used for placing bits within signals
    pub fn with_bit_order(self, order: BitOrder) -> Self {
        Self {
            accumulator: Accumulator::new(order),
            ..self
        }
        .reset()
    }

    /// Retrieve the current [`Cursor`]
    pub fn cursor(&self) -> Cursor {
        Cursor {
            collected: self.accumulator.collected(),
            ..self.cursor
        }
    }

    /// Determine whether all frames were decoded
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Decode the next [`Event`]
    ///
    /// Returns [`None`] once all frames were decoded. Any error leaves the
    /// decoder in an unspecified state.
    pub fn next_event<W: Words>(&mut self, words: &mut W) -> Result<Option<Event>, Error<W::Error>> {
        match self.phase {
            Phase::Done => Ok(None),
            Phase::Delta => {
                let delta = words.next_word().map_err(Error::Source)?;
                let frame = self.cursor.frame;
                log::debug!("frame {frame}: delta {delta}");
                if frame + 1 == self.max_frames {
                    words.restart().map_err(Error::Source)?;
                }
                self.phase = Phase::Body;
                Ok(Some(Event::Delta { frame, delta }))
            }
            Phase::Body => self.next_sample(words).map(|s| Some(Event::Sample(s))),
        }
    }

    /// Create an [`Iterator`] over the remaining [`Event`]s
    ///
    /// The iterator ends after the first error.
    pub fn events<'a, W: Words>(&'a mut self, words: &'a mut W) -> Events<'a, 't, W> {
        Events {
            decoder: self,
            words,
            failed: false,
        }
    }

    /// Decode body bits until the next signal is complete
    fn next_sample<W: Words>(&mut self, words: &mut W) -> Result<Sample, Error<W::Error>> {
        loop {
            if self.cursor.signal == 0 || self.cursor.bit >= self.frame_width {
                return Err(self.misaligned());
            }

            let pos = self.cursor.bit % WORD_BITS;
            if pos == 0 {
                self.word = words.next_word().map_err(Error::Source)?;
            }
            let bit = (self.word >> pos) & 1 != 0;
            self.cursor.bit += 1;

            let sample = self.accumulator.push(bit).map(|bits| Sample {
                id: self.cursor.signal,
                bits,
            });
            if sample.is_some() {
                self.cursor.signal -= 1;
                if let Some(signal) = self.table.get(self.cursor.signal) {
                    self.accumulator.reset(signal.width.get() as usize);
                }
            }

            if self.cursor.bit == self.frame_width {
                if self.cursor.signal != 0 || self.accumulator.collected() != 0 {
                    return Err(self.misaligned());
                }
                self.begin_frame(self.cursor.frame + 1);
            }

            if let Some(sample) = sample {
                return Ok(sample);
            }
        }
    }

    /// Reset the cursor to the start of the given frame
    fn begin_frame(&mut self, frame: u64) {
        let signal = self.table.len();
        self.cursor = Cursor {
            frame,
            bit: 0,
            signal,
            collected: 0,
        };
        if let Some(last) = self.table.get(signal) {
            self.accumulator.reset(last.width.get() as usize);
        }
        self.phase = if frame < self.max_frames {
            Phase::Delta
        } else {
            Phase::Done
        };
    }

    fn reset(mut self) -> Self {
        self.begin_frame(self.cursor.frame);
        self
    }

    fn misaligned<E>(&self) -> Error<E> {
        Error::Misaligned {
            frame: self.cursor.frame,
            bit: self.cursor.bit,
        }
    }
}

/// [`Iterator`] over [`Event`]s
///
/// Create via [`Decoder::events`].
pub struct Events<'a, 't, W> {
    decoder: &'a mut Decoder<'t>,
    words: &'a mut W,
    failed: bool,
}

impl<W: Words> Iterator for Events<'_, '_, W> {
    type Item = Result<Event, Error<W::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let res = self.decoder.next_event(self.words).transpose();
        self.failed = matches!(res, Some(Err(_)));
        res
    }
}

/// Decoding phase within a frame
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Delta,
    Body,
    Done,
}
