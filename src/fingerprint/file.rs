//! Reader and writer for the tab-delimited fingerprint files (`.out` raw, `.outn` normalized).
//!
//! A file starts with `#key<TAB>value` header lines followed by one row per
//! (vector length, allele) pair: `L<TAB>allele<TAB>v_0 ... v_{L-1}`.

use super::{Allele, Fingerprint};
use crate::utils::{open_text_reader, open_text_writer, Result};
use itertools::Itertools;
use std::{
    collections::BTreeMap,
    io::{BufRead, Write},
    path::Path,
};

const KEY_VERSION: &str = "software-version";
const KEY_SOURCE: &str = "source";
const KEY_ALLELE_COUNT: &str = "alleleCount";
const KEY_LENGTHS: &str = "vectorLengths";
const KEY_CREATED: &str = "created";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FingerprintMeta {
    pub software_version: String,
    pub source: String,
    /// Twice the number of genotype calls used, or `None` if the file does not say.
    pub allele_count: Option<u64>,
    pub lengths: Vec<usize>,
    pub created: String,
}

impl FingerprintMeta {
    pub fn new(source: &str, allele_count: u64, lengths: Vec<usize>) -> Self {
        Self {
            software_version: crate::cli::FULL_VERSION.to_string(),
            source: source.to_string(),
            allele_count: Some(allele_count),
            lengths,
            created: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// All fingerprints computed for one individual, keyed by vector length.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintFile {
    pub meta: FingerprintMeta,
    pub fingerprints: BTreeMap<usize, Fingerprint>,
}

impl FingerprintFile {
    pub fn new(meta: FingerprintMeta, fingerprints: impl IntoIterator<Item = Fingerprint>) -> Self {
        Self {
            meta,
            fingerprints: fingerprints
                .into_iter()
                .map(|fp| (fp.length(), fp))
                .collect(),
        }
    }

    pub fn get(&self, length: usize) -> Option<&Fingerprint> {
        self.fingerprints.get(&length)
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.fingerprints.keys().copied().collect()
    }

    /// Applies `f` to every fingerprint, keeping the metadata.
    pub fn map<F: Fn(&Fingerprint) -> Fingerprint>(&self, f: F) -> Self {
        Self {
            meta: self.meta.clone(),
            fingerprints: self
                .fingerprints
                .iter()
                .map(|(&length, fp)| (length, f(fp)))
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        Self::read(reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = open_text_writer(path)?;
        self.write(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| format!("Error writing {}: {}", path.display(), e))
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        let meta = &self.meta;
        writeln!(writer, "#{}\t{}", KEY_VERSION, meta.software_version)?;
        writeln!(writer, "#{}\t{}", KEY_SOURCE, meta.source)?;
        match meta.allele_count {
            Some(count) => writeln!(writer, "#{}\t{}", KEY_ALLELE_COUNT, count)?,
            None => writeln!(writer, "#{}\tNA", KEY_ALLELE_COUNT)?,
        }
        writeln!(writer, "#{}\t{}", KEY_LENGTHS, meta.lengths.iter().join(","))?;
        writeln!(writer, "#{}\t{}", KEY_CREATED, meta.created)?;

        for (length, fingerprint) in &self.fingerprints {
            for allele in Allele::ALL {
                writeln!(
                    writer,
                    "{}\t{}\t{}",
                    length,
                    allele,
                    fingerprint.get(allele).iter().join("\t")
                )?;
            }
        }
        Ok(())
    }

    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut meta = FingerprintMeta::default();
        let mut rows: BTreeMap<usize, [Option<Vec<f64>>; 4]> = BTreeMap::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.is_empty() {
                continue;
            }
            if let Some(header) = line.strip_prefix('#') {
                decode_header_line(header, &mut meta)
                    .map_err(|e| format!("Line {}: {}", line_number + 1, e))?;
                continue;
            }
            match decode_row(&line) {
                Ok((length, allele, values)) => {
                    rows.entry(length).or_default()[allele.index()] = Some(values);
                }
                Err(e) => log::warn!("Skipping fingerprint line {}: {}", line_number + 1, e),
            }
        }

        let mut fingerprints = BTreeMap::new();
        for (length, vectors) in rows {
            if vectors.iter().any(Option::is_none) {
                log::warn!("Dropping vector length {}: not all alleles present", length);
                continue;
            }
            let vectors = vectors.map(Option::unwrap_or_default);
            if let Some(fingerprint) = Fingerprint::from_vectors(vectors) {
                fingerprints.insert(length, fingerprint);
            }
        }
        if meta.lengths.is_empty() {
            meta.lengths = fingerprints.keys().copied().collect();
        }
        Ok(Self { meta, fingerprints })
    }
}

fn decode_header_line(header: &str, meta: &mut FingerprintMeta) -> Result<()> {
    let (key, value) = header.split_once('\t').unwrap_or((header, ""));
    let value = value.trim();
    match key {
        KEY_VERSION => meta.software_version = value.to_string(),
        KEY_SOURCE => meta.source = value.to_string(),
        KEY_ALLELE_COUNT => {
            meta.allele_count = match value {
                "" | "NA" => None,
                _ => Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid allele count: {}", value))?,
                ),
            }
        }
        KEY_LENGTHS => {
            meta.lengths = value
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.trim()
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid vector length: {}", s))
                })
                .collect::<Result<Vec<_>>>()?
        }
        KEY_CREATED => meta.created = value.to_string(),
        _ => log::debug!("Ignoring fingerprint header key: {}", key),
    }
    Ok(())
}

fn decode_row(line: &str) -> Result<(usize, Allele, Vec<f64>)> {
    let mut fields = line.split('\t');
    let length: usize = fields
        .next()
        .and_then(|s| s.parse().ok())
        .filter(|&l| l > 0)
        .ok_or("Invalid vector length")?;
    let allele: Allele = fields.next().ok_or("Missing allele")?.parse()?;
    let values = fields
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| format!("Invalid value '{}'", s))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != length {
        return Err(format!(
            "Expected {} values for L={} allele {}, found {}",
            length,
            length,
            allele,
            values.len()
        ));
    }
    Ok((length, allele, values))
}
