//! Marshal stream writer

use std::collections::HashMap;

use super::types::{StringEncoding, Value};
use super::{MAJOR_VERSION, MINOR_VERSION};

/// Fixnum range of the 32-bit Ruby interpreters bundled with RGSS
const FIXNUM_MIN: i64 = -(1 << 30);
const FIXNUM_MAX: i64 = (1 << 30) - 1;

/// Writer producing the same bytes as `Marshal.dump` on RGSS
///
/// Symbols are interned: the first occurrence is written in full, later ones
/// as `;` links. Objects are never shared, so no `@` links are produced.
pub struct MarshalWriter {
    buffer: Vec<u8>,
    symbols: HashMap<String, usize>,
}

impl Default for MarshalWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarshalWriter {
    pub fn new() -> Self {
        Self {
            buffer: vec![MAJOR_VERSION, MINOR_VERSION],
            symbols: HashMap::new(),
        }
    }

    /// Append a value to the stream
    pub fn write(&mut self, value: &Value) {
        match value {
            Value::Nil => self.buffer.push(b'0'),
            Value::Bool(true) => self.buffer.push(b'T'),
            Value::Bool(false) => self.buffer.push(b'F'),
            Value::Integer(i) => self.write_integer(*i),
            Value::Symbol(name) => self.write_symbol(name),
            Value::String { bytes, encoding } => self.write_string(bytes, encoding),
            Value::Array(items) => {
                self.buffer.push(b'[');
                self.write_long(items.len() as i64);
                for item in items {
                    self.write(item);
                }
            }
            Value::Hash(entries) => {
                self.buffer.push(b'{');
                self.write_long(entries.len() as i64);
                for (key, value) in entries {
                    self.write_hash_key(key);
                    self.write(value);
                }
            }
        }
    }

    /// Consume the writer and return the stream bytes
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    /// Ruby's packed `long` encoding
    fn write_long(&mut self, x: i64) {
        if x == 0 {
            self.buffer.push(0);
        } else if 0 < x && x < 123 {
            self.buffer.push((x + 5) as u8);
        } else if -124 < x && x < 0 {
            self.buffer.push(((x - 5) & 0xFF) as u8);
        } else {
            let mut bytes = [0u8; 8];
            let mut v = x;
            let mut len = 0usize;
            for (i, slot) in bytes.iter_mut().enumerate() {
                *slot = (v & 0xFF) as u8;
                v >>= 8;
                if v == 0 || v == -1 {
                    len = i + 1;
                    break;
                }
            }
            if len == 0 {
                len = bytes.len();
            }
            let count = if v == -1 { -(len as i8) } else { len as i8 };
            self.buffer.push(count as u8);
            self.buffer.extend_from_slice(&bytes[..len]);
        }
    }

    fn write_integer(&mut self, i: i64) {
        if (FIXNUM_MIN..=FIXNUM_MAX).contains(&i) {
            self.buffer.push(b'i');
            self.write_long(i);
            return;
        }

        self.buffer.push(b'l');
        self.buffer.push(if i < 0 { b'-' } else { b'+' });

        let magnitude = i.unsigned_abs().to_le_bytes();
        let mut len = magnitude.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
        if len % 2 == 1 {
            len += 1;
        }
        self.write_long((len / 2) as i64);
        self.buffer.extend_from_slice(&magnitude[..len]);
    }

    fn write_raw_bytes(&mut self, bytes: &[u8]) {
        self.write_long(bytes.len() as i64);
        self.buffer.extend_from_slice(bytes);
    }

    fn write_symbol(&mut self, name: &str) {
        if let Some(&index) = self.symbols.get(name) {
            self.buffer.push(b';');
            self.write_long(index as i64);
            return;
        }

        let index = self.symbols.len();
        self.symbols.insert(name.to_string(), index);

        if name.is_ascii() {
            self.buffer.push(b':');
            self.write_raw_bytes(name.as_bytes());
        } else {
            self.buffer.push(b'I');
            self.buffer.push(b':');
            self.write_raw_bytes(name.as_bytes());
            self.write_long(1);
            self.write_symbol("E");
            self.buffer.push(b'T');
        }
    }

    fn write_string(&mut self, bytes: &[u8], encoding: &StringEncoding) {
        if *encoding == StringEncoding::Binary {
            self.buffer.push(b'"');
            self.write_raw_bytes(bytes);
            return;
        }

        self.buffer.push(b'I');
        self.buffer.push(b'"');
        self.write_raw_bytes(bytes);
        self.write_long(1);
        match encoding {
            StringEncoding::Utf8 => {
                self.write_symbol("E");
                self.buffer.push(b'T');
            }
            StringEncoding::UsAscii => {
                self.write_symbol("E");
                self.buffer.push(b'F');
            }
            StringEncoding::Named(name) => {
                self.write_symbol("encoding");
                self.buffer.push(b'"');
                self.write_raw_bytes(name.as_bytes());
            }
            StringEncoding::Binary => unreachable!("handled above"),
        }
    }

    /// String keys are interned as symbols, like RGSS data hashes
    fn write_hash_key(&mut self, key: &Value) {
        match key {
            Value::String { bytes, .. } => {
                let name = String::from_utf8_lossy(bytes).into_owned();
                self.write_symbol(&name);
            }
            other => self.write(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::load;

    fn dump(value: &Value) -> Vec<u8> {
        let mut writer = MarshalWriter::new();
        writer.write(value);
        writer.finish()
    }

    fn body(value: &Value) -> Vec<u8> {
        dump(value)[2..].to_vec()
    }

    #[test]
    fn test_header() {
        assert_eq!(&dump(&Value::Nil), b"\x04\x080");
    }

    #[test]
    fn test_write_fixnums() {
        assert_eq!(body(&Value::Integer(0)), b"i\x00");
        assert_eq!(body(&Value::Integer(1)), b"i\x06");
        assert_eq!(body(&Value::Integer(122)), b"i\x7f");
        assert_eq!(body(&Value::Integer(123)), b"i\x01\x7b");
        assert_eq!(body(&Value::Integer(256)), b"i\x02\x00\x01");
        assert_eq!(body(&Value::Integer(-1)), b"i\xfa");
        assert_eq!(body(&Value::Integer(-123)), b"i\x80");
        assert_eq!(body(&Value::Integer(-124)), b"i\xff\x84");
        assert_eq!(body(&Value::Integer(-256)), b"i\xff\x00");
        assert_eq!(
            body(&Value::Integer(133_769_420)),
            b"i\x04\xcc\x28\xf9\x07"
        );
    }

    #[test]
    fn test_write_bignum() {
        assert_eq!(body(&Value::Integer(1 << 30)), b"l+\x07\x00\x00\x00\x40");
        assert_eq!(body(&Value::Integer(-(1 << 31))), b"l-\x07\x00\x00\x00\x80");
        for i in [1i64 << 30, -(1 << 40), i64::MAX, i64::MIN] {
            assert_eq!(load(&dump(&Value::Integer(i))).unwrap(), Value::Integer(i));
        }
    }

    #[test]
    fn test_write_strings() {
        assert_eq!(body(&Value::binary("ab")), b"\"\x07ab");
        assert_eq!(body(&Value::utf8("a")), b"I\"\x06a\x06:\x06ET");
    }

    #[test]
    fn test_symbols_are_linked() {
        let value = Value::Array(vec![Value::utf8("a"), Value::utf8("b")]);
        assert_eq!(body(&value), b"[\x07I\"\x06a\x06:\x06ETI\"\x06b\x06;\x00T");
    }

    #[test]
    fn test_hash_string_keys_become_symbols() {
        let value = Value::Hash(vec![
            (Value::utf8("key"), Value::Integer(1)),
            (Value::Symbol("key".to_string()), Value::Integer(2)),
        ]);
        assert_eq!(body(&value), b"{\x07:\x08keyi\x06;\x00i\x07");
    }

    #[test]
    fn test_roundtrip_nested() {
        let value = Value::Array(vec![
            Value::Nil,
            Value::Bool(true),
            Value::Bool(false),
            Value::Integer(-70_000),
            Value::Symbol("sym".to_string()),
            Value::Array(vec![Value::utf8("日本語"), Value::binary(vec![0u8, 255, 10])]),
            Value::Hash(vec![(Value::Integer(1), Value::utf8("one"))]),
        ]);
        assert_eq!(load(&dump(&value)).unwrap(), value);
    }
}
