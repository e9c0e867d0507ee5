//! Ruby Marshal (format 4.8) subset
//!
//! Script bundles are plain `Marshal.dump` output. Only the value types that
//! appear in a bundle are supported:
//!
//! | Tag | Type                          |
//! |-----|-------------------------------|
//! | `0` | nil                           |
//! | `T` | true                          |
//! | `F` | false                         |
//! | `i` | Fixnum                        |
//! | `l` | Bignum (read only up to i64)  |
//! | `"` | String                        |
//! | `I` | instance variables (encoding) |
//! | `:` | Symbol                        |
//! | `;` | Symbol link                   |
//! | `[` | Array                         |
//! | `{` | Hash                          |
//! | `@` | Object link                   |
//!
//! ## Example
//!
//! ```rust
//! use rgss_scripts::marshal::{self, Value};
//!
//! let value = Value::Array(vec![Value::Integer(1), Value::utf8("Main")]);
//! let bytes = marshal::dump(&value);
//! assert_eq!(marshal::load(&bytes)?, value);
//! # Ok::<(), rgss_scripts::Error>(())
//! ```

mod reader;
mod types;
mod writer;

pub use reader::MarshalReader;
pub use types::{StringEncoding, Value};
pub use writer::MarshalWriter;

/// Major version byte written by Ruby 1.8 and later
pub const MAJOR_VERSION: u8 = 4;

/// Minor version byte written by Ruby 1.8 and later
pub const MINOR_VERSION: u8 = 8;

/// Parse a complete Marshal stream
pub fn load(data: &[u8]) -> crate::Result<Value> {
    MarshalReader::new(data).read()
}

/// Serialize a value as a complete Marshal stream
pub fn dump(value: &Value) -> Vec<u8> {
    let mut writer = MarshalWriter::new();
    writer.write(value);
    writer.finish()
}
