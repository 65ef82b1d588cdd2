// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Waveform serializer
//!
//! This module provides the [`Writer`], which turns decoded
//! [`Event`][crate::decoder::Event]s into a VCD waveform. The trace itself
//! does not contain a clock. Instead, the writer synthesizes a clock signal
//! `clk` from the frame deltas, keeping time in half clock periods.
//!
//! The clock is declared with identifier `0`, every signal of the
//! [`SignalTable`] with its 1-based position in the table as identifier.

#[cfg(test)]
mod tests;

use std::io;

use vcd::{IdCode, TimescaleUnit, Value, VarType};

use crate::config::{self, SignalTable};
use crate::decoder::{Event, Sample};

/// Fixed number of half clock periods the recorder lags behind
///
/// This latency is added to the clock synthesized before the first frame.
pub const PIPELINE_LATENCY: u64 = 2;

/// Name of the scope all signals are placed in
pub const SCOPE: &str = "TOP";

/// Name of the synthesized clock signal
pub const CLOCK: &str = "clk";

/// Writer for VCD waveforms
///
/// The header is written upon construction. Afterwards, [`Event`]s are fed via
/// [`process`][Self::process].
pub struct Writer<W: io::Write> {
    vcd: vcd::Writer<W>,
    clock: IdCode,
    signals: Vec<IdCode>,
    offset: u64,
    timestamp: u64,
    marked: Option<u64>,
}

impl<W: io::Write> Writer<W> {
    /// Create a new writer and write the waveform header
    ///
    /// The `offset` of the first frame, as reported by the recorder, is
    /// accounted for when processing the first frame's delta.
    pub fn new(
        out: W,
        table: &SignalTable,
        settings: &config::Waveform,
        offset: u64,
    ) -> io::Result<Self> {
        let mut vcd = vcd::Writer::new(out);
        vcd.version(&settings.version)?;
        vcd.timescale(settings.timescale, TimescaleUnit::NS)?;
        vcd.add_module(SCOPE)?;

        let clock = id_code(0)?;
        vcd.var_def(VarType::Reg, 1, clock, CLOCK, None)?;
        let signals = table
            .iter()
            .enumerate()
            .map(|(i, signal)| {
                let id = id_code(i + 1)?;
                vcd.var_def(VarType::Reg, signal.width.get(), id, &signal.name, None)?;
                Ok(id)
            })
            .collect::<io::Result<_>>()?;

        vcd.upscope()?;
        vcd.enddefinitions()?;

        Ok(Self {
            vcd,
            clock,
            signals,
            offset,
            timestamp: 0,
            marked: None,
        })
    }

    /// Retrieve the current timestamp in half clock periods
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Retrieve the number of full clock cycles written so far
    pub fn cycles(&self) -> u64 {
        self.timestamp / 2
    }

    /// Process a single [`Event`]
    ///
    /// A delta advances the clock. For the first frame, the recorder's offset
    /// and its [pipeline latency][PIPELINE_LATENCY] are added. For every other
    /// frame, the clock is advanced by one additional half period. A sample is
    /// written at the current timestamp.
    pub fn process(&mut self, event: &Event) -> io::Result<()> {
        match event {
            Event::Delta { frame: 0, delta } => self.clock(
                self.offset
                    .saturating_add(*delta)
                    .saturating_add(PIPELINE_LATENCY),
            ),
            Event::Delta { delta, .. } => self.clock(delta.saturating_add(1)),
            Event::Sample(sample) => self.sample(sample),
        }
    }

    /// Emit the given number of clock toggles
    ///
    /// For every toggle, the clock is driven low at the current timestamp and
    /// high at the next one. Each toggle thus advances the timestamp by two.
    pub fn clock(&mut self, toggles: u64) -> io::Result<()> {
        for _ in 0..toggles {
            self.mark()?;
            self.vcd.change_vector(self.clock, [Value::V0])?;
            self.timestamp += 1;
            self.mark()?;
            self.vcd.change_vector(self.clock, [Value::V1])?;
            self.timestamp += 1;
        }
        Ok(())
    }

    /// Write a [`Sample`] at the current timestamp
    pub fn sample(&mut self, sample: &Sample) -> io::Result<()> {
        let id = sample
            .id
            .checked_sub(1)
            .and_then(|i| self.signals.get(i))
            .copied()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unknown signal {}", sample.id),
                )
            })?;
        self.mark()?;
        self.vcd
            .change_vector(id, sample.bits.iter().map(Value::from))
    }

    /// Write a timestamp marker unless one was written for the current time
    fn mark(&mut self) -> io::Result<()> {
        if self.marked != Some(self.timestamp) {
            self.vcd.timestamp(self.timestamp)?;
            self.marked = Some(self.timestamp);
        }
        Ok(())
    }
}

/// Create the [`IdCode`] for the signal with the given identifier
fn id_code(id: usize) -> io::Result<IdCode> {
    id.to_string()
        .parse()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid id {id}")))
}
