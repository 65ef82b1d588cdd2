// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

//! # Host side driver for an on-chip logic analyzer
//!
//! This crate drains the trace recorded by an on-chip logic analyzer (the
//! "recorder") over a pair of 64-bit registers and reconstructs it as a VCD
//! waveform. The recorder samples a fixed set of signals whenever any of them
//! changes and stores each sample as a frame alongside the number of half
//! clock periods elapsed since the previous one.
//!
//! The crate is structured in layers:
//! - [`channel`] abstracts the register access,
//! - [`protocol`] implements the command exchanges on top of it,
//! - [`decoder`] turns the trace stream into per signal values,
//! - [`waveform`] serializes these values together with a synthesized clock
//!   and
//! - [`dump`] ties everything together.
//!
//! [`start`] and [`stop`] are the entry points for the common case. The
//! [`sim`] module provides a software model of the recorder, which allows
//! exercising the whole stack without hardware.
//!
//! # Example
//!
//! ```no_run
//! use scope_dump::channel::mmio::Mmio;
//! use scope_dump::config::Config;
//!
//! # fn map_registers() -> Mmio { unimplemented!() }
//! let config = Config::from_toml(include_str!("../demos/replay/signals.toml")).unwrap();
//! let mut device = map_registers();
//!
//! // Arm the recorder, run the workload, then dump the trace
//! scope_dump::start(Some(&mut device), &config, Some(100)).unwrap();
//! let summary = scope_dump::stop(Some(&mut device), &config, None).unwrap();
//! println!("{} cycles", summary.cycles);
//! ```

pub mod channel;
pub mod config;
pub mod decoder;
pub mod dump;
pub mod encoder;
pub mod error;
pub mod protocol;
pub mod sim;
pub mod waveform;


pub use config::Config;
pub use dump::Summary;
pub use error::{Error, status};

use channel::Channel;
use protocol::{Cancel, Client};

/// Raw delay value denoting that no delay is to be armed
pub const UNSET: u64 = u64::MAX;

/// Convert a raw delay value into an optional delay
///
/// [`UNSET`] maps to [`None`], every other value is a delay in cycles.
pub fn delay(raw: u64) -> Option<u64> {
    (raw != UNSET).then_some(raw)
}

/// Arm the recorder
///
/// If a `delay` is given, the recorder will start recording after that many
/// cycles. Otherwise, no command is issued.
pub fn start<C: Channel>(
    device: Option<C>,
    config: &Config,
    delay: Option<u64>,
) -> Result<(), Error<C::Error>> {
    let device = device.ok_or(Error::NoDevice)?;
    Client::new(device, config.channel).start(delay)?;
    Ok(())
}

/// Stop the recorder and dump its trace
///
/// If a `delay` is given, the recorder is instructed to stop after that many
/// cycles first. Then the trace is dumped to the file configured in
/// [`Config::waveform`] as described in [`dump::to_file`].
pub fn stop<C: Channel>(
    device: Option<C>,
    config: &Config,
    delay: Option<u64>,
) -> Result<Summary, Error<C::Error>> {
    stop_with_cancel(device, config, delay, None)
}

/// Stop the recorder and dump its trace, cancellable via a [`Cancel`] token
///
/// This fn behaves like [`stop`]. However, waiting for the recorder may be
/// cancelled via the given token.
pub fn stop_with_cancel<C: Channel>(
    device: Option<C>,
    config: &Config,
    delay: Option<u64>,
    cancel: Option<&Cancel>,
) -> Result<Summary, Error<C::Error>> {
    let device = device.ok_or(Error::NoDevice)?;
    let mut client = Client::new(device, config.channel);
    client.stop(delay)?;
    dump::to_file(&mut client, config, cancel)
}
