#![no_main]
use std::cell::RefCell;

use arbitrary::Arbitrary;
use glbkit::{JsonNode, JsonWriter, ParseMode, parse, parse_complete};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 1; // mode flags

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r"];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8 & 0x03);

        let mut prefix = HEADER;
        let limit = max_size - prefix;
        prefix += append_whitespace(&mut data[prefix..], limit);
        let limit = max_size - prefix;
        prefix += append_value(&mut data[prefix..], size.max(16), limit);
        let limit = max_size - prefix;
        prefix += append_whitespace(&mut data[prefix..], limit);
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

/// Append up to eight whitespace bytes, never exceeding `limit`.
fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 {
            return 0;
        }
        let n = rng.random_range(1..=limit.min(8));
        for slot in &mut buf[..n] {
            *slot = WS_TABLE[rng.random_range(0..WS_TABLE.len())][0];
        }
        n
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = serde_json::to_vec(&value.0).expect("Failed to serialize arbitrary value");

    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);

    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
        };
        Ok(ArbitraryValue(value))
    }
}

/// Walks every child, as a consumer would.
fn walk(node: JsonNode<'_>) -> glbkit::Result<usize> {
    let mut count = 1;
    if node.kind() == glbkit::NodeKind::Array {
        for item in node.items()? {
            count += walk(item?)?;
        }
    } else if node.kind() == glbkit::NodeKind::Object {
        for entry in node.entries()? {
            let (key, value) = entry?;
            key.get_str()?;
            count += walk(value)?;
        }
    }
    Ok(count)
}

fn parser(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }
    let flags = data[0];
    let Ok(text) = std::str::from_utf8(&data[HEADER..]) else {
        return;
    };

    let mode = match flags & 3 {
        0 => ParseMode::Lazy,
        1 => ParseMode::Recursive,
        _ => ParseMode::ToEnd,
    };
    if let Ok(node) = parse(text, mode) {
        let _ = walk(node);
    }

    // Differential check against serde_json. Depth limits and number range
    // checks differ, so those rejections are not compared.
    let ours = parse_complete(text);
    let reference = serde_json::from_str::<Value>(text);
    match (&ours, &reference) {
        (Ok(_), Err(e))
            if !e.to_string().contains("recursion limit")
                && !e.to_string().contains("out of range") =>
        {
            panic!("accepted input rejected by serde_json: {e}")
        }
        (Err(e), Ok(_)) if !e.to_string().contains("nesting") => {
            panic!("rejected input accepted by serde_json: {e}")
        }
        _ => {}
    }

    // Accepted input re-serializes into text that parses to the same value.
    if let Ok(node) = ours {
        let mut w = JsonWriter::new();
        node.write_to(&mut w).expect("accepted input re-serializes");
        let out = w.finish().expect("writer closes every container");
        let again = parse_complete(&out).expect("writer output parses");
        assert_eq!(
            node.to_value().expect("accepted input materializes"),
            again.to_value().expect("writer output materializes")
        );
    }
}

fuzz_target!(|data: &[u8]| parser(data));
