// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0
//! Capture replay
//!
//! This program replays a captured trace through the software model of the
//! recorder and dumps it as a VCD waveform, exactly as it would be dumped from
//! a device. The signal table and remaining settings are supplied as a TOML
//! configuration (such as `replay/signals.toml` in this directory), the
//! capture as a TOML file listing the recorded frames (such as
//! `replay/capture.toml`).
//!
//! Progress is logged via `env_logger`, e.g. with `RUST_LOG=debug`.

use std::path::PathBuf;

use scope_dump::config::Config;
use scope_dump::decoder::Bits;
use scope_dump::sim::Recorder;

/// A captured trace
#[derive(Debug, serde::Deserialize)]
struct Capture {
    /// Offset of the first frame in half clock periods
    #[serde(default)]
    offset: u64,
    #[serde(rename = "frame")]
    frames: Vec<Frame>,
}

/// A single captured frame
#[derive(Debug, serde::Deserialize)]
struct Frame {
    delta: u64,
    /// Signal values as binary strings, in declaration order
    values: Vec<String>,
}

fn main() {
    env_logger::init();

    let matches = clap::Command::new("Capture replay")
        .arg(
            clap::arg!(<config> "Path to the configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(<capture> "Path to the captured trace")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(-o --output <FILE> "Output file, overriding the configuration")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            clap::arg!(--"start-delay" <CYCLES> "Start delay to arm")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            clap::arg!(--"stop-delay" <CYCLES> "Stop delay to arm")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let config = matches
        .get_one::<PathBuf>("config")
        .expect("No configuration specified");
    let config = std::fs::read_to_string(config).expect("Could not load configuration");
    let mut config = Config::from_toml(&config).expect("Could not parse configuration");
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.waveform.output = output.clone();
    }

    let capture = matches
        .get_one::<PathBuf>("capture")
        .expect("No capture specified");
    let capture = std::fs::read_to_string(capture).expect("Could not load capture");
    let capture: Capture = toml::from_str(&capture).expect("Could not parse capture");

    // Feed the capture into the recorder model...
    let mut recorder = Recorder::new(config.channel, &config.signals)
        .with_bit_order(config.bit_order)
        .with_offset(capture.offset);
    for (i, frame) in capture.frames.iter().enumerate() {
        let values: Vec<Bits> = frame
            .values
            .iter()
            .map(|v| v.parse().expect("Invalid signal value"))
            .collect();
        recorder
            .push_frame(frame.delta, &values)
            .unwrap_or_else(|e| panic!("Could not record frame {i}: {e}"));
    }

    // ... and dump it like any device
    let start_delay = matches.get_one::<u64>("start-delay").copied();
    let stop_delay = matches.get_one::<u64>("stop-delay").copied();
    let res = scope_dump::start(Some(&mut recorder), &config, start_delay)
        .and_then(|_| scope_dump::stop(Some(&mut recorder), &config, stop_delay));
    match res {
        Ok(summary) => eprintln!(
            "Dumped {} frames ({} bits each) spanning {} cycles to '{}'",
            summary.frames,
            summary.frame_width,
            summary.cycles,
            config.waveform.output.display(),
        ),
        Err(e) => {
            eprintln!("Dump failed: {e}");
            std::process::exit(e.status());
        }
    }
}
