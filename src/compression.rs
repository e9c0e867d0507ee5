//! Per-entry script compression
//!
//! Every script body inside a bundle is an independent zlib stream. RGSS
//! produces them with `Zlib::Deflate.deflate`, so the writer uses the best
//! compression level and always finishes the stream.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::{Error, Result};

/// Compress data into one complete zlib stream
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Compress a script body
pub fn compress_text(text: &str) -> Result<Vec<u8>> {
    compress(text.as_bytes())
}

/// Inflate a zlib stream
///
/// Nothing is returned unless the whole stream inflates cleanly. The
/// `read::ZlibDecoder` adapters report a clean EOF on a truncated stream, so
/// the inflater is driven directly until it reports `StreamEnd`.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut decompressed = Vec::with_capacity(data.len().saturating_mul(4).max(256));

    loop {
        if decompressed.len() == decompressed.capacity() {
            decompressed.reserve(decompressed.capacity());
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let consumed = before_in as usize;

        // Finish would require the whole output to fit in the first buffer
        let status = inflater
            .decompress_vec(&data[consumed..], &mut decompressed, FlushDecompress::None)
            .map_err(|e| Error::Decompression(format!("Zlib error: {}", e)))?;

        match status {
            Status::StreamEnd => return Ok(decompressed),
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() == before_in && inflater.total_out() == before_out;
                let output_full = decompressed.len() == decompressed.capacity();
                if stalled && !output_full {
                    return Err(Error::Decompression(format!(
                        "Truncated zlib stream ({} of {} bytes consumed)",
                        inflater.total_in(),
                        data.len()
                    )));
                }
            }
        }
    }
}

/// Inflate a zlib stream holding script text
///
/// Invalid UTF-8 sequences are replaced rather than rejected; RGSS1 projects
/// occasionally carry legacy encodings in comments.
pub fn decompress_text(data: &[u8]) -> Result<String> {
    let bytes = decompress(data)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!("Script body is not valid UTF-8, decoding lossily");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}
