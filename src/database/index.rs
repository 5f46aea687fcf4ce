//! The `.id` text index of a fingerprint database.
//!
//! ```text
//! #created<TAB>2024-05-01T10:00:00+02:00
//! #version<TAB>0.1.0
//! #L<TAB>1000
//! 4<TAB>NA12878<TAB>fp/NA12878.outn.gz
//! 16004<TAB>NA12891<TAB>fp/NA12891.outn.gz
//! ```

use crate::utils::Result;
use semver::Version;
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

/// Size in bytes of one stored integer.
pub const RECORD_UNIT_SIZE: u64 = 4;
/// Size in bytes of the leading record-width field of the `.fp` file.
pub const DATA_HEADER_SIZE: u64 = RECORD_UNIT_SIZE;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexHeader {
    pub created: String,
    pub version: Version,
    pub length: usize,
}

impl IndexHeader {
    pub fn new(length: usize) -> Result<Self> {
        Ok(Self {
            created: chrono::Local::now().to_rfc3339(),
            version: current_version()?,
            length,
        })
    }

    /// Number of integers in one record.
    pub fn record_width(&self) -> usize {
        4 * self.length
    }

    pub fn record_size(&self) -> u64 {
        self.record_width() as u64 * RECORD_UNIT_SIZE
    }

    /// Byte offset of the `k`-th (0-based) record in the `.fp` file.
    pub fn record_offset(&self, k: usize) -> u64 {
        DATA_HEADER_SIZE + k as u64 * self.record_size()
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "#created\t{}", self.created)?;
        writeln!(writer, "#version\t{}", self.version)?;
        writeln!(writer, "#L\t{}", self.length)
    }
}

pub fn current_version() -> Result<Version> {
    Version::parse(env!("CARGO_PKG_VERSION")).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub offset: u64,
    pub name: String,
    pub source: String,
}

impl IndexEntry {
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{}\t{}\t{}", self.offset, self.name, self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseIndex {
    pub header: IndexHeader,
    pub entries: Vec<IndexEntry>,
}

impl DatabaseIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        Self::read(BufReader::new(file)).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut created = String::new();
        let mut version = None;
        let mut length = None;
        let mut entries = Vec::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('#') {
                let (key, value) = header.split_once('\t').unwrap_or((header, ""));
                match key {
                    "created" => created = value.to_string(),
                    "version" => {
                        version = Some(Version::parse(value).map_err(|e| {
                            format!("Invalid version '{}' at line {}: {}", value, line_number + 1, e)
                        })?)
                    }
                    "L" => {
                        length = Some(
                            value
                                .parse::<usize>()
                                .ok()
                                .filter(|&l| l > 0)
                                .ok_or_else(|| format!("Invalid vector length: {}", value))?,
                        )
                    }
                    _ => log::debug!("Ignoring index header key: {}", key),
                }
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let [offset, name, source] = fields[..] else {
                return Err(format!(
                    "Expected 3 fields in the format 'offset name source' at line {}: {}",
                    line_number + 1,
                    line
                ));
            };
            let offset = offset
                .parse()
                .map_err(|_| format!("Invalid offset at line {}: {}", line_number + 1, offset))?;
            entries.push(IndexEntry {
                offset,
                name: name.to_string(),
                source: source.to_string(),
            });
        }

        let header = IndexHeader {
            created,
            version: version.ok_or("Index has no #version header")?,
            length: length.ok_or("Index has no #L header")?,
        };
        for (k, entry) in entries.iter().enumerate() {
            if entry.offset != header.record_offset(k) {
                return Err(format!(
                    "Record {} ({}) has offset {}, expected {}",
                    k + 1,
                    entry.name,
                    entry.offset,
                    header.record_offset(k)
                ));
            }
        }
        Ok(Self { header, entries })
    }

    /// Display name of a 1-based record number, as reported by comparison engines.
    pub fn name_of(&self, record: usize) -> Option<&str> {
        record
            .checked_sub(1)
            .and_then(|k| self.entries.get(k))
            .map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const INDEX: &str = "\
#created\t2024-05-01T10:00:00+02:00\n\
#version\t0.1.0\n\
#L\t2\n\
4\tA\tdata/sample.A.outn.gz\n\
36\tB\tdata/sample.B.outn.gz\n";

    #[test]
    fn read_index() {
        let index = DatabaseIndex::read(Cursor::new(INDEX)).unwrap();
        assert_eq!(index.header.length, 2);
        assert_eq!(index.header.record_width(), 8);
        assert_eq!(index.header.version, Version::new(0, 1, 0));
        assert_eq!(index.len(), 2);
        assert_eq!(index.name_of(2), Some("B"));
        assert_eq!(index.name_of(0), None);
        assert_eq!(index.name_of(3), None);
        assert_eq!(index.entries[0].name, "A");
    }

    #[test]
    fn write_then_read_index() {
        let index = DatabaseIndex::read(Cursor::new(INDEX)).unwrap();
        let mut buffer = Vec::new();
        index.header.write(&mut buffer).unwrap();
        for entry in &index.entries {
            entry.write(&mut buffer).unwrap();
        }
        assert_eq!(String::from_utf8(buffer).unwrap(), INDEX);
    }

    #[test]
    fn read_index_bad_offset_err() {
        let data = INDEX.replace("36\tB", "40\tB");
        let err = DatabaseIndex::read(Cursor::new(data)).unwrap_err();
        assert_eq!(err, "Record 2 (B) has offset 40, expected 36");
    }

    #[test]
    fn read_index_missing_length_err() {
        let data = "#created\tnow\n#version\t0.1.0\n";
        assert_eq!(
            DatabaseIndex::read(Cursor::new(data)).unwrap_err(),
            "Index has no #L header"
        );
    }

    #[test]
    fn read_index_malformed_entry_err() {
        let data = format!("{}68\tC\n", INDEX);
        assert!(DatabaseIndex::read(Cursor::new(data)).is_err());
    }

    #[test]
    fn record_offsets() {
        let header = IndexHeader::new(1000).unwrap();
        assert_eq!(header.record_offset(0), 4);
        assert_eq!(header.record_offset(3), 4 + 3 * 16000);
    }
}
