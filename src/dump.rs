// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Trace dump
//!
//! This module ties the [`Client`], the [`Decoder`] and the waveform
//! [`Writer`] together. A dump waits for the recorder to announce trace data,
//! validates the recorder's metadata against the signal table, streams and
//! decodes all frames and finally verifies that the recorder has no data left.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::channel::Channel;
use crate::config::Config;
use crate::decoder::Decoder;
use crate::error::Error;
use crate::protocol::{Cancel, Client};
use crate::waveform::Writer;

/// Suffix of the file a waveform is written to before it is complete
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Outcome of a successful dump
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of frames decoded
    pub frames: u64,
    /// Width of a single frame in bits
    pub frame_width: u64,
    /// Number of clock cycles in the waveform
    pub cycles: u64,
}

/// Dump the trace into the given output
///
/// Nothing is written to `out` unless the recorder's metadata matches the
/// signal table. In particular, the stream is never started for a mismatching
/// recorder.
pub fn run<C: Channel, W: io::Write>(
    client: &mut Client<C>,
    config: &Config,
    cancel: Option<&Cancel>,
    out: W,
) -> Result<Summary, Error<C::Error>> {
    client.wait_until_ready(&config.poll, cancel)?;
    log::info!("scope trace dump begin...");

    let metadata = client.read_metadata()?;
    metadata.validate(&config.signals)?;

    let mut writer = Writer::new(out, &config.signals, &config.waveform, metadata.offset)?;
    let mut decoder = Decoder::new(&config.signals, metadata.frame_width, metadata.max_frames)
        .with_bit_order(config.bit_order);

    client.begin_data_stream()?;
    while let Some(event) = decoder.next_event(client)? {
        writer.process(&event)?;
    }
    client.end_data_stream()?;

    let cycles = writer.cycles();
    log::info!("scope trace dump done! - {cycles} cycles");
    Ok(Summary {
        frames: metadata.max_frames,
        frame_width: metadata.frame_width,
        cycles,
    })
}

/// Dump the trace into the file configured in [`Config::waveform`]
///
/// The waveform is first written to a file next to the destination, with
/// [`PARTIAL_SUFFIX`] appended to its name. Only after a successful dump is
/// it moved into place. On failure, the partial file is removed and any
/// existing file at the destination is left untouched.
pub fn to_file<C: Channel>(
    client: &mut Client<C>,
    config: &Config,
    cancel: Option<&Cancel>,
) -> Result<Summary, Error<C::Error>> {
    let path = config.waveform.output.as_path();
    let partial = partial_path(path);

    let res: Result<_, Error<C::Error>> = File::create(&partial)
        .map_err(Error::from)
        .and_then(|file| {
            let mut out = BufWriter::new(file);
            let summary = run(client, config, cancel, &mut out)?;
            out.flush()?;
            drop(out);
            fs::rename(&partial, path)?;
            Ok(summary)
        });

    match res {
        Ok(summary) => {
            log::debug!("waveform written to {}", path.display());
            Ok(summary)
        }
        Err(e) => {
            if let Err(err) = fs::remove_file(&partial) {
                log::warn!("could not remove {}: {err}", partial.display());
            }
            Err(e)
        }
    }
}

/// Retrieve the path of the partial file for the given destination
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PARTIAL_SUFFIX);
    name.into()
}
