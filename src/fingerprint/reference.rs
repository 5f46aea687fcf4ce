//! Population allele-frequency table keyed by the numeric part of an rsid.
//!

use super::Allele;
use crate::utils::{open_text_reader, Result};
use std::{collections::HashMap, io::BufRead, path::Path};

/// Extracts the numeric identifier from an `rs<number>` variant id.
pub fn parse_rsid(id: &str) -> Option<u64> {
    let digits = id.strip_prefix("rs")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Reference frequencies for one variant, indexed by `Allele`.
///
/// Letters absent from the table row are stored as zero. The frequencies need
/// not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlleleFrequencies([f64; 4]);

impl AlleleFrequencies {
    pub fn new(frequencies: [f64; 4]) -> Self {
        Self(frequencies)
    }

    #[inline]
    pub fn get(&self, allele: Allele) -> f64 {
        self.0[allele.index()]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Default)]
pub struct ReferenceTable {
    variants: HashMap<u64, AlleleFrequencies>,
}

impl ReferenceTable {
    /// Loads a (possibly gzip-compressed) frequency table. Any malformed line
    /// aborts the load.
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading reference frequencies from {}", path.display());
        let reader = open_text_reader(path)
            .map_err(|e| format!("Unable to open reference table: {}", e))?;
        let table =
            Self::from_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))?;
        log::info!("Loaded reference frequencies for {} variants", table.len());
        Ok(table)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut variants = HashMap::new();
        let mut non_rsid = 0usize;

        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split('\t');
            // split always yields at least one field
            let id = fields.next().unwrap_or_default();
            let Some(variant) = parse_rsid(id) else {
                non_rsid += 1;
                continue;
            };
            let frequencies = parse_frequencies(fields)
                .map_err(|e| format!("Line {}: {}", line_number + 1, e))?;
            variants.insert(variant, frequencies);
        }

        if non_rsid > 0 {
            log::debug!("Ignored {} reference rows without an rsid", non_rsid);
        }
        Ok(Self { variants })
    }

    #[inline]
    pub fn get(&self, variant: u64) -> Option<&AlleleFrequencies> {
        self.variants.get(&variant)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl FromIterator<(u64, AlleleFrequencies)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (u64, AlleleFrequencies)>>(iter: I) -> Self {
        Self {
            variants: iter.into_iter().collect(),
        }
    }
}

fn parse_frequencies<'a>(mut fields: impl Iterator<Item = &'a str>) -> Result<AlleleFrequencies> {
    let mut frequencies = [0.0; 4];
    while let Some(allele) = fields.next() {
        let value = fields
            .next()
            .ok_or_else(|| format!("Allele '{}' has no frequency", allele))?;
        let frequency: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("Invalid frequency '{}' for allele '{}'", value, allele))?;
        // Indel and multi-base alleles never bin, so they carry no expectation.
        if let Ok(allele) = allele.parse::<Allele>() {
            frequencies[allele.index()] += frequency;
        }
    }
    Ok(AlleleFrequencies(frequencies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_rsid_variants() {
        assert_eq!(parse_rsid("rs1"), Some(1));
        assert_eq!(parse_rsid("rs123456789"), Some(123456789));
        assert_eq!(parse_rsid("i7001234"), None);
        assert_eq!(parse_rsid("rs"), None);
        assert_eq!(parse_rsid("rs12a"), None);
        assert_eq!(parse_rsid("."), None);
    }

    #[test]
    fn reference_from_reader() {
        let data = "\
#id\tallele\tfreq\n\
rs1\tA\t0.3\tC\t0.7\n\
rs42\tG\t0.5\tT\t0.25\tA\t0.2\n\
i900\tA\t1.0\n";
        let table = ReferenceTable::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(table.len(), 2);
        let rs1 = table.get(1).unwrap();
        assert_eq!(rs1.get(Allele::A), 0.3);
        assert_eq!(rs1.get(Allele::C), 0.7);
        assert_eq!(rs1.get(Allele::G), 0.0);
        let rs42 = table.get(42).unwrap();
        assert!((rs42.total() - 0.95).abs() < 1e-12);
        assert!(table.get(900).is_none());
    }

    #[test]
    fn reference_ignores_non_nucleotide_alleles() {
        let data = "rs5\tA\t0.6\t-\t0.4\n";
        let table = ReferenceTable::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(table.get(5).unwrap().total(), 0.6);
    }

    #[test]
    fn reference_missing_frequency_err() {
        let data = "rs1\tA\t0.3\n\
rs2\tA\n";
        let result = ReferenceTable::from_reader(Cursor::new(data));
        assert_eq!(
            result.unwrap_err(),
            "Line 2: Allele 'A' has no frequency".to_string()
        );
    }

    #[test]
    fn reference_invalid_frequency_err() {
        let data = "rs1\tA\tabc\n";
        assert!(ReferenceTable::from_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn reference_missing_file_err() {
        assert!(ReferenceTable::load(Path::new("/nonexistent/ref.tsv.gz")).is_err());
    }
}
