// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

use crate::config::Signal;
use crate::encoder::Encoder;

fn table(widths: &[u32]) -> SignalTable {
    let signals: Vec<_> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| Signal::new(format!("s{i}"), (*w).try_into().expect("Zero width")))
        .collect();
    SignalTable::try_from(signals).expect("Could not build table")
}

fn bits(s: &str) -> Bits {
    s.parse().expect("Could not parse bits")
}

fn sample(id: usize, s: &str) -> Event {
    Event::Sample(Sample { id, bits: bits(s) })
}

/// Encode the given frames, decode them again and compare the results
fn roundtrip(table: &SignalTable, order: BitOrder, frames: &[(u64, Vec<Bits>)]) {
    let encoder = Encoder::new(table).with_bit_order(order);
    let mut words = Vec::new();
    frames.iter().for_each(|(delta, values)| {
        encoder
            .encode_frame(*delta, values, &mut words)
            .expect("Could not encode frame")
    });
    assert_eq!(words.len(), frames.len() * (1 + encoder.body_words()));

    let mut source = from_slice(&words);
    let mut decoder =
        Decoder::new(table, table.frame_width(), frames.len() as u64).with_bit_order(order);
    for (frame, (delta, values)) in frames.iter().enumerate() {
        let event = decoder.next_event(&mut source).expect("Could not decode");
        assert_eq!(
            event,
            Some(Event::Delta {
                frame: frame as u64,
                delta: *delta
            })
        );
        for (i, value) in values.iter().enumerate().rev() {
            let event = decoder.next_event(&mut source).expect("Could not decode");
            let expected = Sample {
                id: i + 1,
                bits: value.clone(),
            };
            assert_eq!(event, Some(Event::Sample(expected)));
        }
    }
    assert!(decoder.is_done());
    assert_eq!(decoder.next_event(&mut source), Ok(None));
    assert_eq!(source.words_left(), 0);
}

macro_rules! roundtrip_test {
    ($n:ident, [$($w:literal),*], [$($d:literal => [$($v:expr),*]),*]) => {
        mod $n {
            use super::*;

            fn frames(table: &SignalTable) -> Vec<(u64, Vec<Bits>)> {
                vec![$(($d, {
                    let values: Vec<u128> = vec![$($v),*];
                    values
                        .into_iter()
                        .zip(table.iter())
                        .map(|(v, s)| Bits::from_u128(v, s.width.get()))
                        .collect()
                })),*]
            }

            #[test]
            fn msb_first() {
                let table = table(&[$($w),*]);
                roundtrip(&table, BitOrder::MsbFirst, &frames(&table));
            }

            #[test]
            fn lsb_first() {
                let table = table(&[$($w),*]);
                roundtrip(&table, BitOrder::LsbFirst, &frames(&table));
            }
        }
    };
}

roundtrip_test!(small, [3, 5], [1 => [0b101, 0b00110], 2 => [0b011, 0b11111]]);
roundtrip_test!(single_bits, [1, 1, 1, 1], [0 => [1, 0, 1, 1], 0 => [0, 0, 0, 0]]);
roundtrip_test!(
    word_exact,
    [64],
    [0 => [0x8000_0000_0000_0001], 5 => [0xffff_ffff_ffff_ffff]]
);
roundtrip_test!(
    straddle,
    [60, 10],
    [1 => [0x0abc_def0_1234_567, 0x2a5], 3 => [0, 0x3ff], 9 => [0xfff_ffff_ffff_ffff, 0]]
);
roundtrip_test!(
    wide,
    [100, 1, 27],
    [7 => [0x1_2345_6789_abcd_ef01_2345_6789, 1, 0x7ff_ffff]]
);
roundtrip_test!(
    padded,
    [13, 7, 1],
    [1 => [0x1fff, 0x55, 1], 1 => [0x0aaa, 0, 0], 1000 => [0x1234, 0x7f, 1]]
);

macro_rules! layout_test {
    ($n:ident, $o:ident, $w:literal) => {
        #[test]
        fn $n() {
            let table = table(&[3, 5]);
            let words: [u64; 2] = [1, $w];
            let mut source = from_slice(&words);
            let events = Decoder::new(&table, 8, 1)
                .with_bit_order(BitOrder::$o)
                .events(&mut source)
                .collect::<Result<Vec<_>, _>>()
                .expect("Could not decode");
            assert_eq!(
                events,
                [
                    Event::Delta { frame: 0, delta: 1 },
                    sample(2, "00110"),
                    sample(1, "101"),
                ]
            );
        }
    };
}

// First consumed bit lands in the MSB of the last signal
layout_test!(layout_msb_first, MsbFirst, 0xac);
// Plain concatenation `{a, b}`
layout_test!(layout_lsb_first, LsbFirst, 0xa6);
// Padding is ignored
layout_test!(layout_padding, MsbFirst, 0xffff_ff00_0000_00ac);

#[test]
fn one_word_short() {
    let table = table(&[3, 5]);
    let words: [u64; 3] = [1, 0xac, 2];
    let mut source = from_slice(&words);
    let mut decoder = Decoder::new(&table, 8, 2);
    let mut events = decoder.events(&mut source);
    assert_eq!(events.by_ref().take(4).count(), 4);
    assert_eq!(
        events.next(),
        Some(Err(Error::Source(EndOfTrace { consumed: 3 })))
    );
    assert_eq!(events.next(), None);
}

#[test]
fn exact_frame_count() {
    let table = table(&[3, 5]);
    let words: [u64; 6] = [1, 0xac, 2, 0xac, 3, 0xac];
    let mut source = from_slice(&words);
    let mut decoder = Decoder::new(&table, 8, 2);
    assert_eq!(decoder.events(&mut source).count(), 6);
    assert!(decoder.is_done());
    assert_eq!(source.words_left(), 2);
}

#[test]
fn frame_width_too_large() {
    let table = table(&[3, 5]);
    let words: [u64; 2] = [1, 0xac];
    let mut source = from_slice(&words);
    let mut decoder = Decoder::new(&table, 9, 1);
    let res = decoder
        .events(&mut source)
        .collect::<Result<Vec<_>, _>>();
    assert_eq!(res, Err(Error::Misaligned { frame: 0, bit: 8 }));
}

#[test]
fn frame_width_too_small() {
    let table = table(&[3, 5]);
    let words: [u64; 2] = [1, 0xac];
    let mut source = from_slice(&words);
    let mut decoder = Decoder::new(&table, 7, 1);
    let res = decoder
        .events(&mut source)
        .collect::<Result<Vec<_>, _>>();
    assert_eq!(res, Err(Error::Misaligned { frame: 0, bit: 7 }));
}

#[test]
fn no_frames() {
    let table = table(&[3, 5]);
    let mut source = from_slice(&[]);
    let mut decoder = Decoder::new(&table, 8, 0);
    assert!(decoder.is_done());
    assert_eq!(decoder.next_event(&mut source), Ok(None));
}

#[test]
fn cursor() {
    let table = table(&[3, 5]);
    let words: [u64; 4] = [1, 0xac, 2, 0xac];
    let mut source = from_slice(&words);
    let mut decoder = Decoder::new(&table, 8, 2);
    assert_eq!(
        decoder.cursor(),
        Cursor {
            frame: 0,
            bit: 0,
            signal: 2,
            collected: 0
        }
    );
    decoder.next_event(&mut source).expect("Could not decode");
    decoder.next_event(&mut source).expect("Could not decode");
    assert_eq!(
        decoder.cursor(),
        Cursor {
            frame: 0,
            bit: 5,
            signal: 1,
            collected: 0
        }
    );
    decoder.next_event(&mut source).expect("Could not decode");
    assert_eq!(
        decoder.cursor(),
        Cursor {
            frame: 1,
            bit: 0,
            signal: 2,
            collected: 0
        }
    );
}

/// [`Words`] source recording when it was restarted
struct Restarts<'a> {
    inner: Slice<'a>,
    consumed: usize,
    restarts: Vec<usize>,
}

impl Words for Restarts<'_> {
    type Error = EndOfTrace;

    fn next_word(&mut self) -> Result<u64, Self::Error> {
        let word = self.inner.next_word()?;
        self.consumed += 1;
        Ok(word)
    }

    fn restart(&mut self) -> Result<(), Self::Error> {
        self.restarts.push(self.consumed);
        Ok(())
    }
}

macro_rules! restart_test {
    ($n:ident, $f:literal, $r:expr) => {
        #[test]
        fn $n() {
            let table = table(&[60, 10]);
            let words: Vec<u64> = (0..$f * 3).collect();
            let mut source = Restarts {
                inner: from_slice(&words),
                consumed: 0,
                restarts: Vec::new(),
            };
            let mut decoder = Decoder::new(&table, 70, $f);
            decoder
                .events(&mut source)
                .try_for_each(|e| e.map(|_| ()))
                .expect("Could not decode");
            assert_eq!(source.restarts, $r);
        }
    };
}

restart_test!(restart_single, 1, [1]);
restart_test!(restart_last, 3, [7]);

#[test]
fn bits_conversion() {
    let value = Bits::from_u128(0b0110, 4);
    assert_eq!(value, bits("0110"));
    assert_eq!(value.to_u128(), Some(6));
    assert_eq!(value.to_string(), "0110");
    assert_eq!(Bits::from_u128(u128::MAX, 130).to_u128(), None);
    assert!(Bits::from_u128(u128::MAX, 130).to_string().starts_with("001"));
    assert_eq!("01x".parse::<Bits>(), Err(bits::InvalidDigit('x')));
}
