//! Wire codec for snapshot blobs.

use ot_common::{OptionMap, OptionValue};
use tracing::debug;

/// Injectable serialization boundary for snapshot blobs.
pub trait SnapshotCodec: Send + Sync {
    fn encode(&self, options: &OptionMap) -> Vec<u8>;

    /// `None` means the blob is corrupt or not a map; the caller treats
    /// that as "nothing to restore".
    fn decode(&self, bytes: &[u8]) -> Option<OptionMap>;
}

/// Length-prefixed text encoding.
///
/// Scalars are `s:<byte-len>:"<bytes>";`, lists `l:<count>:{...}`, maps
/// `a:<count>:{<key><value>...}` with scalar-encoded keys. Byte-length
/// prefixes keep embedded quotes and braces unambiguous, and map iteration
/// order makes the output deterministic.
#[derive(Debug, Default)]
pub struct WireCodec;

/// Nesting guard for decode; stored values are at most two levels deep.
const MAX_DEPTH: usize = 8;

/// Length prefixes are capped well above any realistic option payload.
const MAX_LENGTH_DIGITS: usize = 9;

impl SnapshotCodec for WireCodec {
    fn encode(&self, options: &OptionMap) -> Vec<u8> {
        let mut out = String::new();
        encode_map(options, &mut out);
        out.into_bytes()
    }

    fn decode(&self, bytes: &[u8]) -> Option<OptionMap> {
        let mut parser = Parser { bytes, pos: 0 };
        let map = parser.map(0)?;
        if parser.pos != bytes.len() {
            debug!(
                trailing = bytes.len() - parser.pos,
                "Trailing bytes after snapshot payload"
            );
            return None;
        }
        Some(map)
    }
}

fn encode_value(value: &OptionValue, out: &mut String) {
    match value {
        OptionValue::Scalar(s) => encode_scalar(s, out),
        OptionValue::List(items) => {
            out.push_str(&format!("l:{}:{{", items.len()));
            for item in items {
                encode_value(item, out);
            }
            out.push('}');
        }
        OptionValue::Map(map) => encode_map(map, out),
    }
}

fn encode_map(map: &OptionMap, out: &mut String) {
    out.push_str(&format!("a:{}:{{", map.len()));
    for (key, value) in map {
        encode_scalar(key, out);
        encode_value(value, out);
    }
    out.push('}');
}

fn encode_scalar(s: &str, out: &mut String) {
    out.push_str(&format!("s:{}:\"", s.len()));
    out.push_str(s);
    out.push_str("\";");
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn value(&mut self, depth: usize) -> Option<OptionValue> {
        if depth > MAX_DEPTH {
            return None;
        }
        match self.peek()? {
            b's' => self.scalar().map(OptionValue::Scalar),
            b'l' => self.list(depth).map(OptionValue::List),
            b'a' => self.map(depth).map(OptionValue::Map),
            _ => None,
        }
    }

    fn scalar(&mut self) -> Option<String> {
        self.expect(b's')?;
        self.expect(b':')?;
        let len = self.length()?;
        self.expect(b':')?;
        self.expect(b'"')?;
        let start = self.pos;
        let end = start.checked_add(len)?;
        if end > self.bytes.len() {
            return None;
        }
        let text = String::from_utf8(self.bytes[start..end].to_vec()).ok()?;
        self.pos = end;
        self.expect(b'"')?;
        self.expect(b';')?;
        Some(text)
    }

    fn list(&mut self, depth: usize) -> Option<Vec<OptionValue>> {
        self.expect(b'l')?;
        self.expect(b':')?;
        let count = self.length()?;
        self.expect(b':')?;
        self.expect(b'{')?;
        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(self.value(depth + 1)?);
        }
        self.expect(b'}')?;
        Some(items)
    }

    fn map(&mut self, depth: usize) -> Option<OptionMap> {
        if depth > MAX_DEPTH {
            return None;
        }
        self.expect(b'a')?;
        self.expect(b':')?;
        let count = self.length()?;
        self.expect(b':')?;
        self.expect(b'{')?;
        let mut map = OptionMap::new();
        for _ in 0..count {
            let key = self.scalar()?;
            let value = self.value(depth + 1)?;
            map.insert(key, value);
        }
        self.expect(b'}')?;
        Some(map)
    }

    fn length(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start || self.pos - start > MAX_LENGTH_DIGITS {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        if self.peek()? == byte {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }
}
