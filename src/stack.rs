//! Finalized part records and their transport encoding
use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::ser::Formatter;

use crate::parts::ExtraData;

/// `(attachment, cup, referenced part id)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordPosition(pub u8, pub u8, pub u32);

/// `(part type name, positions, extra data)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartRecord(pub &'static str, pub Vec<RecordPosition>, pub ExtraData);

/// JSON layout with `", "` and `": "` separators, which consumers of the
/// artifact compare byte for byte.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Append-only list of finalized parts.
#[derive(Debug, Default)]
pub struct CompileStack {
    records: Vec<PartRecord>,
}

impl CompileStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a record and returns its 1-based id.
    pub fn append(&mut self, record: PartRecord) -> u32 {
        self.records.push(record);
        self.records.len() as u32
    }

    pub fn records(&self) -> &[PartRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.records.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Encodes the records as base64 over their JSON form.
    pub fn terminate(&self) -> serde_json::Result<String> {
        Ok(STANDARD.encode(self.to_json()?))
    }
}
