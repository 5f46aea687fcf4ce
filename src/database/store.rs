//! Append-only fingerprint database: a `.fp` file of fixed-width rank records
//! and the `.id` index describing them.
//!
//! The `.fp` file starts with one little-endian `i32` holding the record width
//! (`4 * L`), followed by records of `4 * L` little-endian `i32` ranks.

use super::index::{current_version, DatabaseIndex, IndexEntry, IndexHeader, DATA_HEADER_SIZE};
use crate::utils::Result;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::{
    collections::HashSet,
    fs::{self, File, OpenOptions},
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

pub fn index_path(base: &str) -> PathBuf {
    PathBuf::from(format!("{}.id", base))
}

pub fn data_path(base: &str) -> PathBuf {
    PathBuf::from(format!("{}.fp", base))
}

/// Exclusive hold on a database, released on drop.
#[derive(Debug)]
pub struct DatabaseLock {
    path: PathBuf,
}

impl DatabaseLock {
    pub fn acquire(base: &str) -> Result<Self> {
        let path = PathBuf::from(format!("{}.lock", base));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(format!(
                "Database {} is locked by another process (remove {} if stale)",
                base,
                path.display()
            )),
            Err(e) => Err(format!("Failed to lock {}: {}", path.display(), e)),
        }
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

/// Loads a database index and checks that the data file holds exactly the indexed records.
pub fn open_index(base: &str) -> Result<DatabaseIndex> {
    let index = DatabaseIndex::load(&index_path(base))?;
    check_compatible(&index.header, base)?;
    check_data_size(&index, &data_path(base))?;
    Ok(index)
}

fn check_compatible(header: &IndexHeader, base: &str) -> Result<()> {
    let ours = current_version()?;
    if header.version.major != ours.major {
        return Err(format!(
            "Database {} was written by version {}, incompatible with {}",
            base, header.version, ours
        ));
    }
    Ok(())
}

fn check_data_size(index: &DatabaseIndex, data: &Path) -> Result<()> {
    let size = fs::metadata(data)
        .map_err(|e| format!("{}: {}", data.display(), e))?
        .len();
    let expected = index.header.record_offset(index.len());
    if size != expected {
        return Err(format!(
            "Database is inconsistent: {} has {} bytes, index lists {} records of L={} ({} bytes)",
            data.display(),
            size,
            index.len(),
            index.header.length,
            expected
        ));
    }
    Ok(())
}

/// Appends rank records to a database, creating it on first use.
pub struct DatabaseWriter {
    index: DatabaseIndex,
    names: HashSet<String>,
    data: BufWriter<File>,
    index_file: BufWriter<File>,
    _lock: DatabaseLock,
}

impl DatabaseWriter {
    /// Opens `<base>.id`/`<base>.fp` for appending. A new database is created
    /// for vector length `length`; an existing one must have been created with it.
    pub fn open(base: &str, length: usize) -> Result<Self> {
        let lock = DatabaseLock::acquire(base)?;
        let (index_path, data_path) = (index_path(base), data_path(base));

        let index = if index_path.exists() {
            let index = open_index(base)?;
            if index.header.length != length {
                return Err(format!(
                    "Database {} holds fingerprints of L={}, cannot add L={}",
                    base, index.header.length, length
                ));
            }
            log::info!("Appending to database {} ({} records)", base, index.len());
            index
        } else {
            if data_path.exists() {
                return Err(format!(
                    "Data file {} exists without index {}",
                    data_path.display(),
                    index_path.display()
                ));
            }
            log::info!("Creating database {} with L={}", base, length);
            create(&index_path, &data_path, IndexHeader::new(length)?)?
        };

        let open_append = |path: &Path| {
            OpenOptions::new()
                .append(true)
                .open(path)
                .map(BufWriter::new)
                .map_err(|e| format!("{}: {}", path.display(), e))
        };
        let names = index.entries.iter().map(|e| e.name.clone()).collect();
        Ok(Self {
            data: open_append(&data_path)?,
            index_file: open_append(&index_path)?,
            index,
            names,
            _lock: lock,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Appends one record. Returns `false` without writing if `name` is
    /// already present.
    pub fn append(&mut self, name: &str, source: &str, ranks: &[u32]) -> Result<bool> {
        if self.contains(name) {
            log::debug!("{} is already in the database, skipping", name);
            return Ok(false);
        }
        if let Some(field) = [name, source]
            .into_iter()
            .find(|field| field.contains(['\t', '\n', '\r']))
        {
            return Err(format!(
                "Cannot store {:?}: names and sources may not contain tabs or line breaks",
                field
            ));
        }
        let width = self.index.header.record_width();
        if ranks.len() != width {
            return Err(format!(
                "Record for {} has {} values, database expects {}",
                name,
                ranks.len(),
                width
            ));
        }
        let entry = IndexEntry {
            offset: self.index.header.record_offset(self.index.len()),
            name: name.to_string(),
            source: source.to_string(),
        };

        // Data goes to disk before the index line that points at it.
        let write_err = |e: io::Error| format!("Failed to write record for {}: {}", name, e);
        for &rank in ranks {
            self.data
                .write_i32::<LittleEndian>(rank as i32)
                .map_err(write_err)?;
        }
        self.data.flush().map_err(write_err)?;
        entry.write(&mut self.index_file).map_err(write_err)?;
        self.index_file.flush().map_err(write_err)?;

        self.names.insert(entry.name.clone());
        self.index.entries.push(entry);
        Ok(true)
    }
}

fn create(index_path: &Path, data_path: &Path, header: IndexHeader) -> Result<DatabaseIndex> {
    let mut data = File::create(data_path).map_err(|e| format!("{}: {}", data_path.display(), e))?;
    data.write_i32::<LittleEndian>(header.record_width() as i32)
        .map_err(|e| format!("{}: {}", data_path.display(), e))?;

    let mut index_file =
        File::create(index_path).map_err(|e| format!("{}: {}", index_path.display(), e))?;
    header
        .write(&mut index_file)
        .map_err(|e| format!("{}: {}", index_path.display(), e))?;

    Ok(DatabaseIndex {
        header,
        entries: Vec::new(),
    })
}

/// Rank records read back from a `.fp` file.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    pub width: usize,
    pub records: Vec<Vec<i32>>,
}

/// Reads every complete record of a `.fp` file. A trailing partial record is
/// reported and ignored.
pub fn read_data_file(path: &Path) -> Result<DataFile> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let size = file
        .metadata()
        .map_err(|e| format!("{}: {}", path.display(), e))?
        .len();
    let mut reader = BufReader::new(file);
    let width = read_width(&mut reader).map_err(|e| format!("{}: {}", path.display(), e))?;

    let record_size = width as u64 * 4;
    let body = size.saturating_sub(DATA_HEADER_SIZE);
    let num_records = body / record_size;
    if body % record_size != 0 {
        log::warn!(
            "{}: ignoring {} trailing bytes of an incomplete record",
            path.display(),
            body % record_size
        );
    }

    let mut records = Vec::with_capacity(num_records as usize);
    for k in 0..num_records {
        let mut record = vec![0i32; width];
        reader
            .read_i32_into::<LittleEndian>(&mut record)
            .map_err(|e| format!("{}: record {}: {}", path.display(), k + 1, e))?;
        records.push(record);
    }
    Ok(DataFile { width, records })
}

/// Reads the `k`-th (0-based) record without loading the rest of the file.
pub fn read_record(path: &Path, k: usize) -> Result<Vec<i32>> {
    let mut file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let width = read_width(&mut file).map_err(|e| format!("{}: {}", path.display(), e))?;
    let offset = DATA_HEADER_SIZE + (k * width * 4) as u64;
    let mut record = vec![0i32; width];
    file.seek(SeekFrom::Start(offset))
        .and_then(|_| file.read_i32_into::<LittleEndian>(&mut record))
        .map_err(|e| format!("{}: record {}: {}", path.display(), k + 1, e))?;
    Ok(record)
}

fn read_width<R: Read>(reader: &mut R) -> Result<usize> {
    let width = reader
        .read_i32::<LittleEndian>()
        .map_err(|e| format!("Missing record width header: {}", e))?;
    if width <= 0 || width % 4 != 0 {
        return Err(format!("Invalid record width: {}", width));
    }
    Ok(width as usize)
}
