//! Marshal stream reader

use std::io::{Cursor, Read};

use byteorder::ReadBytesExt;

use super::types::{StringEncoding, Value};
use super::{MAJOR_VERSION, MINOR_VERSION};
use crate::error::{Error, Result};

const TYPE_NIL: u8 = b'0';
const TYPE_TRUE: u8 = b'T';
const TYPE_FALSE: u8 = b'F';
const TYPE_FIXNUM: u8 = b'i';
const TYPE_BIGNUM: u8 = b'l';
const TYPE_STRING: u8 = b'"';
const TYPE_IVAR: u8 = b'I';
const TYPE_SYMBOL: u8 = b':';
const TYPE_SYMLINK: u8 = b';';
const TYPE_ARRAY: u8 = b'[';
const TYPE_HASH: u8 = b'{';
const TYPE_HASH_DEF: u8 = b'}';
const TYPE_LINK: u8 = b'@';

/// Nesting limit; bundles are two levels deep
const MAX_DEPTH: usize = 128;

/// Where a registered object starts in the stream
#[derive(Debug, Clone, Copy)]
struct ObjectEntry {
    offset: u64,
    /// False while the object is still being read
    complete: bool,
}

/// Reader for a single Marshal stream
///
/// Keeps the symbol and object tables the way Ruby's `r_symbol`/`r_entry`
/// do, so `;` and `@` back-references resolve to the same indices. The
/// object table only records offsets; an `@` link re-reads the object.
pub struct MarshalReader<'a> {
    cursor: Cursor<&'a [u8]>,
    symbols: Vec<String>,
    objects: Vec<ObjectEntry>,
}

impl<'a> MarshalReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            symbols: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Read the version header and the root value
    pub fn read(mut self) -> Result<Value> {
        let major = self.byte()?;
        let minor = self.byte()?;
        if major != MAJOR_VERSION || minor > MINOR_VERSION {
            return Err(Error::Format(format!(
                "Unsupported marshal version {}.{} (expected {}.{})",
                major, minor, MAJOR_VERSION, MINOR_VERSION
            )));
        }

        let value = self.read_value(0)?;

        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        if remaining > 0 {
            tracing::debug!("Ignoring {} trailing bytes after marshal data", remaining);
        }

        Ok(value)
    }

    fn byte(&mut self) -> Result<u8> {
        self.cursor.read_u8().map_err(|_| self.eof())
    }

    fn eof(&self) -> Error {
        Error::Format(format!(
            "Unexpected end of data at offset {}",
            self.cursor.position()
        ))
    }

    /// Ruby's packed `long` encoding
    fn read_long(&mut self) -> Result<i64> {
        let c = self.cursor.read_i8().map_err(|_| self.eof())? as i64;
        if c == 0 {
            return Ok(0);
        }

        if c > 0 {
            if c > 4 {
                return Ok(c - 5);
            }
            let mut x: i64 = 0;
            for i in 0..c {
                x |= (self.byte()? as i64) << (8 * i);
            }
            Ok(x)
        } else {
            if c < -4 {
                return Ok(c + 5);
            }
            let mut x: i64 = -1;
            for i in 0..-c {
                x &= !(0xFF << (8 * i));
                x |= (self.byte()? as i64) << (8 * i);
            }
            Ok(x)
        }
    }

    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_long()?;
        let remaining = self.cursor.get_ref().len() as u64 - self.cursor.position();
        // Every element takes at least one byte, so a larger count is corrupt
        if len < 0 || len as u64 > remaining {
            return Err(Error::Format(format!(
                "Invalid length {} at offset {}",
                len,
                self.cursor.position()
            )));
        }
        Ok(len as usize)
    }

    fn read_raw_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        let mut bytes = vec![0u8; len];
        self.cursor.read_exact(&mut bytes).map_err(|_| self.eof())?;
        Ok(bytes)
    }

    /// Register the object whose tag byte is at `offset`
    fn register(&mut self, offset: u64) -> usize {
        self.objects.push(ObjectEntry {
            offset,
            complete: false,
        });
        self.objects.len() - 1
    }

    fn complete(&mut self, index: usize) {
        self.objects[index].complete = true;
    }

    fn read_value(&mut self, depth: usize) -> Result<Value> {
        let tag = self.byte()?;
        self.read_tagged(tag, depth)
    }

    fn read_tagged(&mut self, tag: u8, depth: usize) -> Result<Value> {
        if depth > MAX_DEPTH {
            return Err(Error::Format("Marshal data nested too deeply".to_string()));
        }
        // The tag byte has just been consumed
        let offset = self.cursor.position() - 1;
        match tag {
            TYPE_NIL => Ok(Value::Nil),
            TYPE_TRUE => Ok(Value::Bool(true)),
            TYPE_FALSE => Ok(Value::Bool(false)),
            TYPE_FIXNUM => Ok(Value::Integer(self.read_long()?)),
            TYPE_BIGNUM => self.read_bignum(offset),
            TYPE_STRING => {
                let index = self.register(offset);
                let value = Value::binary(self.read_raw_bytes()?);
                self.complete(index);
                Ok(value)
            }
            TYPE_SYMBOL => Ok(Value::Symbol(self.read_symbol_body()?)),
            TYPE_SYMLINK => Ok(Value::Symbol(self.read_symlink()?)),
            TYPE_IVAR => self.read_ivar(depth),
            TYPE_ARRAY => {
                let index = self.register(offset);
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.read_value(depth + 1)?);
                }
                let value = Value::Array(items);
                self.complete(index);
                Ok(value)
            }
            TYPE_HASH | TYPE_HASH_DEF => {
                let index = self.register(offset);
                let len = self.read_len()?;
                let mut entries = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = self.read_value(depth + 1)?;
                    let value = self.read_value(depth + 1)?;
                    entries.push((key, value));
                }
                if tag == TYPE_HASH_DEF {
                    // Default value is not part of the entries
                    let _default = self.read_value(depth + 1)?;
                }
                let value = Value::Hash(entries);
                self.complete(index);
                Ok(value)
            }
            TYPE_LINK => {
                let index = self.read_long()?;
                self.read_link(index, depth)
            }
            other => Err(Error::Format(format!(
                "Unsupported marshal type {:?} (0x{:02X}) at offset {}",
                other as char,
                other,
                offset
            ))),
        }
    }

    fn read_bignum(&mut self, offset: u64) -> Result<Value> {
        let index = self.register(offset);
        let sign = self.byte()?;
        let shorts = self.read_len()?;
        let mut magnitude: u64 = 0;
        for i in 0..shorts * 2 {
            let byte = self.byte()? as u64;
            if i >= 8 {
                if byte != 0 {
                    return Err(Error::Format("Bignum exceeds 64 bits".to_string()));
                }
                continue;
            }
            magnitude |= byte << (8 * i);
        }

        let value = match sign {
            b'+' => i64::try_from(magnitude).ok(),
            b'-' => 0i64.checked_sub_unsigned(magnitude),
            other => {
                return Err(Error::Format(format!(
                    "Invalid bignum sign 0x{:02X}",
                    other
                )))
            }
        }
        .ok_or_else(|| Error::Format("Bignum exceeds 64 bits".to_string()))?;

        self.complete(index);
        Ok(Value::Integer(value))
    }

    fn read_symbol_body(&mut self) -> Result<String> {
        let bytes = self.read_raw_bytes()?;
        let symbol = String::from_utf8_lossy(&bytes).into_owned();
        self.symbols.push(symbol.clone());
        Ok(symbol)
    }

    fn read_symlink(&mut self) -> Result<String> {
        let index = self.read_long()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .cloned()
            .ok_or_else(|| Error::Format(format!("Invalid symbol link ;{}", index)))
    }

    /// A symbol in key position (`:`, `;`, or an encoded `I:` symbol)
    fn read_symbol(&mut self, depth: usize) -> Result<String> {
        match self.byte()? {
            TYPE_SYMBOL => self.read_symbol_body(),
            TYPE_SYMLINK => self.read_symlink(),
            TYPE_IVAR => {
                if self.byte()? != TYPE_SYMBOL {
                    return Err(Error::Format("Expected symbol inside ivar".to_string()));
                }
                let symbol = self.read_symbol_body()?;
                self.read_ivars(depth)?;
                Ok(symbol)
            }
            other => Err(Error::Format(format!(
                "Expected symbol, found type 0x{:02X}",
                other
            ))),
        }
    }

    fn read_ivars(&mut self, depth: usize) -> Result<Vec<(String, Value)>> {
        if depth > MAX_DEPTH {
            return Err(Error::Format("Marshal data nested too deeply".to_string()));
        }
        let count = self.read_len()?;
        let mut ivars = Vec::with_capacity(count);
        for _ in 0..count {
            let key = self.read_symbol(depth + 1)?;
            let value = self.read_value(depth + 1)?;
            ivars.push((key, value));
        }
        Ok(ivars)
    }

    fn read_ivar(&mut self, depth: usize) -> Result<Value> {
        let start = self.cursor.position() - 1;
        let tag = self.byte()?;
        if tag == TYPE_IVAR {
            return Err(Error::Format(format!(
                "Nested instance variable wrapper at offset {}",
                start + 1
            )));
        }
        let registers = matches!(tag, TYPE_STRING | TYPE_ARRAY | TYPE_HASH | TYPE_HASH_DEF);
        let index = self.objects.len();

        let mut value = self.read_tagged(tag, depth + 1)?;
        if registers {
            // A link to this object must see the ivars too
            self.objects[index].offset = start;
        }
        let ivars = self.read_ivars(depth)?;

        if let Value::String { encoding, .. } = &mut value {
            for (key, ivar) in ivars {
                match (key.as_str(), ivar) {
                    ("E", Value::Bool(true)) => *encoding = StringEncoding::Utf8,
                    ("E", Value::Bool(false)) => *encoding = StringEncoding::UsAscii,
                    ("encoding", Value::String { bytes, .. }) => {
                        *encoding =
                            StringEncoding::Named(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    _ => {}
                }
            }
        }

        Ok(value)
    }

    /// Resolve `@index` by reading the object again from its offset
    ///
    /// Symbols and objects registered while re-reading are dropped so later
    /// back-references keep their indices.
    fn read_link(&mut self, index: i64, depth: usize) -> Result<Value> {
        let entry = usize::try_from(index)
            .ok()
            .and_then(|i| self.objects.get(i))
            .copied()
            .ok_or_else(|| Error::Format(format!("Invalid object link @{}", index)))?;
        if !entry.complete {
            return Err(Error::Format(format!(
                "Cyclic object link @{} is not supported",
                index
            )));
        }

        let resume = self.cursor.position();
        let symbols = self.symbols.len();
        let objects = self.objects.len();

        self.cursor.set_position(entry.offset);
        let value = self.read_value(depth + 1);

        self.cursor.set_position(resume);
        self.symbols.truncate(symbols);
        self.objects.truncate(objects);
        value
    }
}
