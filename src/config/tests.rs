// Copyright (C) 2025 FZI Forschungszentrum Informatik
// SPDX-License-Identifier: Apache-2.0

use super::*;

fn signal(name: &str, width: u32) -> Signal {
    Signal::new(name, width.try_into().expect("Zero width"))
}

macro_rules! table_test {
    ($n:ident, [$($s:literal: $w:literal),*], Ok($fw:literal)) => {
        #[test]
        fn $n() {
            let signals: Vec<Signal> = vec![$(signal($s, $w)),*];
            let table = SignalTable::try_from(signals).expect("Could not build table");
            assert_eq!(table.frame_width(), $fw);
            assert_eq!(table.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), [$($s),*]);
        }
    };
    ($n:ident, [$($s:literal: $w:literal),*], Err($e:pat)) => {
        #[test]
        fn $n() {
            let signals: Vec<Signal> = vec![$(signal($s, $w)),*];
            let res = SignalTable::try_from(signals);
            assert!(matches!(res, Err($e)), "Unexpected result: {res:?}");
        }
    };
}

table_test!(single, ["a": 1], Ok(1));
table_test!(two, ["a": 3, "b": 5], Ok(8));
table_test!(multi_word, ["pc": 64, "insn": 32, "valid": 1], Ok(97));
table_test!(empty, [], Err(Error::NoSignals));
table_test!(duplicate, ["a": 1, "b": 2, "a": 3], Err(Error::DuplicateName(_)));
table_test!(empty_name, ["": 1], Err(Error::InvalidName(_)));
table_test!(space_in_name, ["a b": 1], Err(Error::InvalidName(_)));
table_test!(dollar_in_name, ["$end": 1], Err(Error::InvalidName(_)));

#[test]
fn one_based_ids() {
    let table = SignalTable::try_from(vec![signal("a", 3), signal("b", 5)])
        .expect("Could not build table");
    assert_eq!(table.get(0), None);
    assert_eq!(table.get(1).map(|s| s.name.as_str()), Some("a"));
    assert_eq!(table.get(2).map(|s| s.name.as_str()), Some("b"));
    assert_eq!(table.get(3), None);
}

#[test]
fn defaults() {
    let table = SignalTable::try_from(vec![signal("a", 1)]).expect("Could not build table");
    let config = Config::new(table, Offsets::from_dword_indices(0, 2));
    assert_eq!(config.poll, POLL);
    assert_eq!(config.poll.timeout, None);
    assert_eq!(config.waveform.output, PathBuf::from("scope.vcd"));
    assert_eq!(config.waveform.timescale, 1);
    assert_eq!(config.bit_order, BitOrder::MsbFirst);
}

#[cfg(feature = "toml")]
mod from_toml {
    use super::*;

    #[test]
    fn full() {
        let config = Config::from_toml(
            r#"
            bit-order = "lsb-first"

            [channel]
            command = 0xa0
            response = 0xa8

            [poll]
            interval = 10
            timeout = 2500

            [waveform]
            output = "out/trace.vcd"
            version = "test"
            timescale = 10

            [[signal]]
            name = "valid"
            width = 1

            [[signal]]
            name = "pc"
            width = 32
            "#,
        )
        .expect("Could not parse config");

        assert_eq!(config.signals.len(), 2);
        assert_eq!(config.signals.frame_width(), 33);
        assert_eq!(config.channel, Offsets::from_dword_indices(0x28, 0x2a));
        assert_eq!(config.poll.interval, Duration::from_millis(10));
        assert_eq!(config.poll.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.waveform.output, PathBuf::from("out/trace.vcd"));
        assert_eq!(config.waveform.version, "test");
        assert_eq!(config.waveform.timescale, 10);
        assert_eq!(config.bit_order, BitOrder::LsbFirst);
    }

    #[test]
    fn minimal() {
        let config = Config::from_toml(
            r#"
            channel = { command = 0, response = 8 }

            [[signal]]
            name = "a"
            width = 3
            "#,
        )
        .expect("Could not parse config");

        assert_eq!(config.poll, POLL);
        assert_eq!(config.waveform, Waveform::default());
        assert_eq!(config.bit_order, BitOrder::MsbFirst);
    }

    #[test]
    fn partial_poll() {
        let config = Config::from_toml(
            r#"
            channel = { command = 0, response = 8 }
            poll = { timeout = 100 }

            [[signal]]
            name = "a"
            width = 3
            "#,
        )
        .expect("Could not parse config");

        assert_eq!(config.poll.interval, POLL.interval);
        assert_eq!(config.poll.timeout, Some(Duration::from_millis(100)));
    }

    macro_rules! rejection_test {
        ($n:ident, $doc:literal) => {
            #[test]
            fn $n() {
                let res = Config::from_toml($doc);
                assert!(matches!(res, Err(Error::Parse(_))), "Unexpected result: {res:?}");
            }
        };
    }

    rejection_test!(no_signals, "channel = { command = 0, response = 8 }\nsignal = []\n");
    rejection_test!(
        missing_channel,
        "[[signal]]\nname = \"a\"\nwidth = 1\n"
    );
    rejection_test!(
        zero_width,
        "channel = { command = 0, response = 8 }\n[[signal]]\nname = \"a\"\nwidth = 0\n"
    );
    rejection_test!(
        duplicate,
        "channel = { command = 0, response = 8 }\n\
         [[signal]]\nname = \"a\"\nwidth = 1\n\
         [[signal]]\nname = \"a\"\nwidth = 2\n"
    );
    rejection_test!(
        bad_bit_order,
        "bit-order = \"middle\"\nchannel = { command = 0, response = 8 }\n\
         [[signal]]\nname = \"a\"\nwidth = 1\n"
    );
}
