//! Line-protocol codecs

use std::io::{self, Write};

use contracts::{Codec, CodecKind, DataPoint};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Rough size of one encoded line, used to pre-size buffers
const LINE_SIZE_HINT: usize = 48;

/// Writes `<name> <value> <timestamp>\n` for every point, in batch order
fn write_lines<W: Write>(out: &mut W, batch: &[DataPoint]) -> io::Result<()> {
    for point in batch {
        writeln!(out, "{point}")?;
    }
    Ok(())
}

/// Plaintext line protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn encode(&self, batch: &[DataPoint]) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(batch.len() * LINE_SIZE_HINT);
        write_lines(&mut buf, batch)?;
        Ok(buf)
    }
}

/// Plaintext lines compressed as one gzip member
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: Compression,
}

impl GzipCodec {
    pub fn new(level: Compression) -> Self {
        Self { level }
    }
}

impl Default for GzipCodec {
    fn default() -> Self {
        Self::new(Compression::fast())
    }
}

impl Codec for GzipCodec {
    fn encode(&self, batch: &[DataPoint]) -> io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        write_lines(&mut encoder, batch)?;
        encoder.finish()
    }
}

/// Codec selected from configuration
#[derive(Debug, Clone, Copy)]
pub enum LineCodec {
    Plain(PlainCodec),
    Gzip(GzipCodec),
}

impl From<CodecKind> for LineCodec {
    fn from(kind: CodecKind) -> Self {
        match kind {
            CodecKind::Plain => Self::Plain(PlainCodec),
            CodecKind::Gzip => Self::Gzip(GzipCodec::default()),
        }
    }
}

impl Codec for LineCodec {
    fn encode(&self, batch: &[DataPoint]) -> io::Result<Vec<u8>> {
        match self {
            Self::Plain(codec) => codec.encode(batch),
            Self::Gzip(codec) => codec.encode(batch),
        }
    }
}
