// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use crate::config::Signal;
use crate::decoder::Bits;

fn table() -> SignalTable {
    SignalTable::try_from(vec![
        Signal::new("a", 3.try_into().expect("Zero width")),
        Signal::new("b", 5.try_into().expect("Zero width")),
    ])
    .expect("Could not build table")
}

fn sample(id: usize, s: &str) -> Event {
    let bits: Bits = s.parse().expect("Could not parse bits");
    Event::Sample(Sample { id, bits })
}

/// Retrieve the lines following the header
fn body(out: &[u8]) -> Vec<&str> {
    let text = core::str::from_utf8(out).expect("Invalid UTF-8");
    let (_, body) = text
        .split_once("$enddefinitions $end")
        .expect("No end of definitions");
    body.split_whitespace().collect()
}

/// Retrieve all timestamps in the order they were written
fn timestamps(out: &[u8]) -> Vec<u64> {
    body(out)
        .into_iter()
        .filter_map(|t| t.strip_prefix('#'))
        .map(|t| t.parse().expect("Invalid timestamp"))
        .collect()
}

fn write(offset: u64, events: &[Event]) -> (Vec<u8>, u64) {
    let mut out = Vec::new();
    let mut writer = Writer::new(&mut out, &table(), &Default::default(), offset)
        .expect("Could not write header");
    events
        .iter()
        .try_for_each(|e| writer.process(e))
        .expect("Could not write event");
    let cycles = writer.cycles();
    drop(writer);
    (out, cycles)
}

#[test]
fn header() {
    let settings = config::Waveform {
        version: String::from("test version"),
        timescale: 10,
        ..Default::default()
    };
    let mut out = Vec::new();
    Writer::new(&mut out, &table(), &settings, 0).expect("Could not write header");
    let text = String::from_utf8(out).expect("Invalid UTF-8");

    let expected = [
        "test version",
        "$timescale 10 ns $end",
        "$scope module TOP $end",
        "$var reg 1 0 clk $end",
        "$var reg 3 1 a $end",
        "$var reg 5 2 b $end",
        "$upscope $end",
        "$enddefinitions $end",
    ];
    let mut rest = text.as_str();
    for line in expected {
        let pos = rest
            .find(line)
            .unwrap_or_else(|| panic!("\"{line}\" missing in header:\n{text}"));
        rest = &rest[pos + line.len()..];
    }
    assert_eq!(rest.trim(), "");
}

#[test]
fn first_frame() {
    let (out, cycles) = write(
        0,
        &[
            Event::Delta { frame: 0, delta: 1 },
            sample(2, "00110"),
            sample(1, "101"),
        ],
    );
    assert_eq!(
        body(&out),
        [
            "#0", "b0", "0", "#1", "b1", "0", "#2", "b0", "0", "#3", "b1", "0", "#4", "b0", "0",
            "#5", "b1", "0", "#6", "b00110", "2", "b101", "1",
        ]
    );
    assert_eq!(cycles, 3);
}

#[test]
fn two_frames() {
    let (out, cycles) = write(
        0,
        &[
            Event::Delta { frame: 0, delta: 1 },
            sample(2, "00110"),
            sample(1, "101"),
            Event::Delta { frame: 1, delta: 2 },
            sample(2, "11111"),
            sample(1, "011"),
        ],
    );
    let body = body(&out);
    let second = body
        .iter()
        .position(|t| *t == "b101")
        .expect("First frame missing");
    assert_eq!(
        body[second + 2..],
        [
            "b0", "0", "#7", "b1", "0", "#8", "b0", "0", "#9", "b1", "0", "#10", "b0", "0", "#11",
            "b1", "0", "#12", "b11111", "2", "b011", "1",
        ]
    );
    assert_eq!(cycles, 6);
}

#[test]
fn offset() {
    let (out, cycles) = write(4, &[Event::Delta { frame: 0, delta: 0 }]);
    assert_eq!(timestamps(&out), (0..12).collect::<Vec<_>>());
    assert_eq!(cycles, 6);
}

macro_rules! advance_test {
    ($n:ident, $o:literal, [$($d:literal),*]) => {
        #[test]
        fn $n() {
            let deltas: Vec<u64> = vec![$($d),*];
            let events: Vec<_> = deltas
                .iter()
                .enumerate()
                .flat_map(|(frame, delta)| {
                    [
                        Event::Delta { frame: frame as u64, delta: *delta },
                        sample(2, "00000"),
                        sample(1, "111"),
                    ]
                })
                .collect();
            let (out, cycles) = write($o, &events);

            let toggles = $o + PIPELINE_LATENCY + deltas[0]
                + deltas[1..].iter().map(|d| d + 1).sum::<u64>();
            let timestamps = timestamps(&out);
            assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(timestamps.last().copied(), Some(2 * toggles));
            assert_eq!(cycles, toggles);
        }
    };
}

advance_test!(advance_single, 0, [0]);
advance_test!(advance_offset, 3, [5]);
advance_test!(advance_many, 1, [2, 0, 0, 7, 1]);

#[test]
fn clock_only() {
    let mut out = Vec::new();
    let mut writer =
        Writer::new(&mut out, &table(), &Default::default(), 0).expect("Could not write header");
    writer.clock(0).expect("Could not write clock");
    assert_eq!(writer.timestamp(), 0);
    writer.clock(2).expect("Could not write clock");
    assert_eq!(writer.timestamp(), 4);
    drop(writer);
    assert_eq!(timestamps(&out), [0, 1, 2, 3]);
}

#[test]
fn unknown_signal() {
    let mut out = Vec::new();
    let mut writer =
        Writer::new(&mut out, &table(), &Default::default(), 0).expect("Could not write header");
    let err = writer
        .process(&sample(3, "1"))
        .expect_err("Unknown signal accepted");
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    let err = writer
        .process(&sample(0, "1"))
        .expect_err("Unknown signal accepted");
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}
