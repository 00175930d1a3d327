//! Fuzz target: `LineDecoder::feed` + `parse_request`
//!
//! Drives arbitrary bytes from a provisioning client through the line
//! decoder and the request parser.  Neither may panic, and an accepted
//! request must only carry values that were on the wire.
//!
//! cargo fuzz run fuzz_provision_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensornode::provision::codec::{LineDecoder, MAX_LINE_LEN, parse_request};

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    // Split the input into two reads, as a TCP peer might.
    let split = data.first().map_or(0, |&b| usize::from(b)).min(data.len());
    let first = decoder.feed(&data[..split]).map(|l| l.map(<[u8]>::to_vec));
    let line = match first {
        Ok(Some(line)) => Some(line),
        Ok(None) => decoder.feed(&data[split..]).ok().flatten().map(<[u8]>::to_vec),
        Err(_) => None,
    };

    let Some(line) = line else { return };
    assert!(line.len() <= MAX_LINE_LEN, "decoder yielded an over-long line");
    assert!(!line.contains(&b'\n'), "newline leaked into the line");

    if let Ok(text) = core::str::from_utf8(&line) {
        if let Ok(req) = parse_request(text) {
            for value in [&req.ssid, &req.password, &req.device_name, &req.token] {
                assert!(text.contains(value.as_str()));
            }
        }
    }
});
