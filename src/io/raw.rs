//! Read / write float arrays as raw little-endian binary, without any header

pub fn write(data: impl Iterator<Item = f32>, path: &Path) -> io::Result<()> {
    let mut buf = BufWriter::new(File::create(path)?);
    for datum in data {
        buf.write_all(&datum.to_le_bytes())?;
    }
    buf.flush()
}

/// Read the whole file. Fails if its length is not a multiple of 4 bytes.
pub fn read(path: &Path) -> io::Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!(
            "{} is {} bytes long, not a whole number of f32s", path.display(), bytes.len())))
    }
    Ok(chunks.map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
}

// ----- Imports ------------------------------------------------------------------------------------------
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
