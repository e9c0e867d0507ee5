//! Script bundle format handling
//!
//! A bundle (`Scripts.rxdata`, `Scripts.rvdata`, `Scripts.rvdata2`) is a
//! Marshal dump of an array of `[section, name, zlib(code)]` triples.
//!
//! ## Example
//!
//! ```rust
//! use rgss_scripts::bundle::{decode, encode, WriteOptions};
//! use rgss_scripts::ScriptEntry;
//!
//! let entries = vec![ScriptEntry::new(1, "Main", "rgss_main { SceneManager.run }")];
//! let bytes = encode(&entries, &WriteOptions::default())?;
//! assert_eq!(decode(&bytes)?, entries);
//! # Ok::<(), rgss_scripts::Error>(())
//! ```

use std::fs;
use std::path::Path;

use crate::compression::{compress_text, decompress_text};
use crate::error::{Error, Result};
use crate::marshal::{self, Value};
use crate::script::ScriptEntry;

/// Options for encoding bundles
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Tag names as UTF-8 strings (RGSS3). RGSS1/RGSS2 run Ruby 1.8, which
    /// has no string encodings, so their names are written as plain bytes.
    pub utf8_names: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { utf8_names: true }
    }
}

/// Decode bundle bytes into script entries
///
/// The structure is validated before anything is inflated: the root must be
/// an array and every element a `[Integer, String, String]` triple.
pub fn decode(data: &[u8]) -> Result<Vec<ScriptEntry>> {
    let root = marshal::load(data)?;
    let items = match root {
        Value::Array(items) => items,
        other => {
            return Err(Error::Format(format!(
                "Expected an array of scripts, found {}",
                other.type_name()
            )))
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| RawRecord::from_value(index, item))
        .collect::<Result<Vec<_>>>()?;

    records
        .into_iter()
        .map(|record| {
            let code = decompress_text(&record.code).map_err(|e| match e {
                Error::Decompression(msg) => Error::Decompression(format!(
                    "Script #{} ({}): {}",
                    record.index, record.name, msg
                )),
                other => other,
            })?;
            Ok(ScriptEntry {
                section: record.section,
                name: record.name,
                code,
            })
        })
        .collect()
}

/// Encode script entries as bundle bytes
pub fn encode(entries: &[ScriptEntry], options: &WriteOptions) -> Result<Vec<u8>> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = if options.utf8_names {
            Value::utf8(entry.name.clone())
        } else {
            Value::binary(entry.name.as_bytes())
        };
        items.push(Value::Array(vec![
            Value::Integer(entry.section),
            name,
            Value::binary(compress_text(&entry.code)?),
        ]));
    }
    Ok(marshal::dump(&Value::Array(items)))
}

/// Read and decode a bundle file
pub fn read_bundle<P: AsRef<Path>>(path: P) -> Result<Vec<ScriptEntry>> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| Error::from_io(e, path))?;
    decode(&data)
}

/// Encode entries and write them to `path`, replacing any existing file
pub fn write_bundle<P: AsRef<Path>>(
    path: P,
    entries: &[ScriptEntry],
    options: &WriteOptions,
) -> Result<()> {
    let data = encode(entries, options)?;
    fs::write(path, data)?;
    Ok(())
}

/// A validated triple whose code is still compressed
struct RawRecord {
    index: usize,
    section: i64,
    name: String,
    code: Vec<u8>,
}

impl RawRecord {
    fn from_value(index: usize, value: Value) -> Result<Self> {
        let type_name = value.type_name();
        let fields = value.into_array().ok_or_else(|| {
            Error::Format(format!("Script #{} is a {}, expected an array", index, type_name))
        })?;

        let [section, name, code]: [Value; 3] = fields.try_into().map_err(|fields: Vec<Value>| {
            Error::Format(format!(
                "Script #{} has {} fields, expected 3",
                index,
                fields.len()
            ))
        })?;

        let section = section.as_integer().ok_or_else(|| field_error(index, "section", "integer", &section))?;
        let name = name
            .as_str_lossy()
            .map(|s| s.into_owned())
            .ok_or_else(|| field_error(index, "name", "string", &name))?;
        let code = match code {
            Value::String { bytes, .. } => bytes,
            other => return Err(field_error(index, "code", "string", &other)),
        };

        Ok(Self {
            index,
            section,
            name,
            code,
        })
    }
}

fn field_error(index: usize, field: &str, expected: &str, found: &Value) -> Error {
    Error::Format(format!(
        "Script #{} {} must be a {}, found {}",
        index,
        field,
        expected,
        found.type_name()
    ))
}
