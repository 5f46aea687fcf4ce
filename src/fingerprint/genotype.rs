//! Genotype calls and the sources that produce them.

use super::{reference::parse_rsid, Allele};
use crate::utils::{open_text_reader, parse_autosome, Result};
use rust_htslib::bcf::{self, Read as BcfRead};
use std::{
    fmt,
    io::{BufRead, BufReader, Lines, Read as ioRead},
    path::Path,
    str::FromStr,
};

/// One individual's unordered nucleotide pair at one autosomal variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenotypeCall {
    pub variant: u64,
    pub chrom: u8,
    pub position: u64,
    pub alleles: [Allele; 2],
}

/// Why a genotype record did not become a call. Skips are expected in real
/// data and never abort processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Malformed,
    VariantId,
    Chromosome,
    Genotype,
    UnknownVariant,
    Filtered,
}

impl SkipReason {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }

    fn label(self) -> &'static str {
        match self {
            SkipReason::Malformed => "malformed record",
            SkipReason::VariantId => "non-rsid variant",
            SkipReason::Chromosome => "non-autosomal chromosome",
            SkipReason::Genotype => "invalid genotype",
            SkipReason::UnknownVariant => "variant absent from reference",
            SkipReason::Filtered => "filtered by region or distance",
        }
    }

    const ALL: [SkipReason; SkipReason::COUNT] = [
        SkipReason::Malformed,
        SkipReason::VariantId,
        SkipReason::Chromosome,
        SkipReason::Genotype,
        SkipReason::UnknownVariant,
        SkipReason::Filtered,
    ];
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl GenotypeCall {
    pub fn parse(
        id: &str,
        chrom: &str,
        position: u64,
        genotype: &str,
    ) -> std::result::Result<Self, SkipReason> {
        let variant = parse_rsid(id).ok_or(SkipReason::VariantId)?;
        let chrom = parse_autosome(chrom).ok_or(SkipReason::Chromosome)?;
        let alleles = match genotype.as_bytes() {
            [first, second] => [
                Allele::from_byte(*first).ok_or(SkipReason::Genotype)?,
                Allele::from_byte(*second).ok_or(SkipReason::Genotype)?,
            ],
            _ => return Err(SkipReason::Genotype),
        };
        Ok(Self {
            variant,
            chrom,
            position,
            alleles,
        })
    }

    /// Decodes a tab-delimited `rsid chrom position genotype` record.
    pub fn from_tsv_line(line: &str) -> std::result::Result<Self, SkipReason> {
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let [id, chrom, position, genotype] = fields[..] else {
            return Err(SkipReason::Malformed);
        };
        let position = position.parse().map_err(|_| SkipReason::Malformed)?;
        Self::parse(id, chrom, position, genotype)
    }
}

/// A record read from a genotype source: either a usable call or the reason it was dropped.
pub type CallRecord = std::result::Result<GenotypeCall, SkipReason>;

/// Tally of accepted calls and skipped records.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CallStats {
    pub accepted: u64,
    skipped: [u64; SkipReason::COUNT],
}

impl CallStats {
    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn skip(&mut self, reason: SkipReason) {
        self.skipped[reason.index()] += 1;
    }

    pub fn skipped(&self, reason: SkipReason) -> u64 {
        self.skipped[reason.index()]
    }

    pub fn total_skipped(&self) -> u64 {
        self.skipped.iter().sum()
    }

    pub fn log_summary(&self) {
        log::info!(
            "Genotype calls used={}, skipped={}",
            self.accepted,
            self.total_skipped()
        );
        for reason in SkipReason::ALL {
            let count = self.skipped(reason);
            if count > 0 {
                log::info!("  skipped ({}): {}", reason, count);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Auto,
    Tsv,
    Vcf,
}

impl FromStr for InputFormat {
    type Err = &'static str;
    fn from_str(format: &str) -> std::result::Result<Self, Self::Err> {
        match format {
            "auto" => Ok(InputFormat::Auto),
            "tsv" | "23andme" => Ok(InputFormat::Tsv),
            "vcf" => Ok(InputFormat::Vcf),
            _ => Err("Invalid input format. Options are: auto, tsv, vcf"),
        }
    }
}

impl InputFormat {
    pub fn resolve(self, path: &Path) -> InputFormat {
        match self {
            InputFormat::Auto => {
                let name = path.to_string_lossy().to_lowercase();
                if name.ends_with(".vcf") || name.ends_with(".vcf.gz") || name.ends_with(".bcf") {
                    InputFormat::Vcf
                } else {
                    InputFormat::Tsv
                }
            }
            other => other,
        }
    }
}

/// Opens a genotype source and returns an iterator over its records.
pub fn open_calls(
    path: &Path,
    format: InputFormat,
    sample: Option<&str>,
) -> Result<Box<dyn Iterator<Item = Result<CallRecord>>>> {
    match format.resolve(path) {
        InputFormat::Vcf => Ok(Box::new(VcfCalls::from_path(path, sample)?)),
        _ => {
            if sample.is_some() {
                log::warn!("Sample name is ignored for tab-delimited genotype input");
            }
            Ok(Box::new(TsvCalls::from_path(path)?))
        }
    }
}

/// Tab-delimited genotype records, as written by genotype extractors and
/// consumer genotyping services. Lines starting with `#` are comments.
pub struct TsvCalls<R> {
    lines: std::iter::Enumerate<Lines<R>>,
}

impl<R: BufRead> TsvCalls<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines().enumerate(),
        }
    }
}

impl<R: BufRead> Iterator for TsvCalls<R> {
    type Item = Result<CallRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (line_number, line) = self.lines.next()?;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(format!(
                        "Error reading genotype line {}: {}",
                        line_number + 1,
                        e
                    )))
                }
            };
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let record = GenotypeCall::from_tsv_line(&line);
            if record == Err(SkipReason::Malformed) {
                log::warn!("Skipping malformed genotype line {}: {}", line_number + 1, line);
            }
            return Some(Ok(record));
        }
    }
}

impl TsvCalls<BufReader<Box<dyn ioRead>>> {
    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(open_text_reader(path)?))
    }
}

/// Diploid SNV calls of one sample from a VCF/BCF file.
pub struct VcfCalls {
    reader: bcf::Reader,
    record: bcf::Record,
    sample: usize,
}

impl VcfCalls {
    pub fn from_path(path: &Path, sample: Option<&str>) -> Result<Self> {
        let reader = bcf::Reader::from_path(path)
            .map_err(|e| format!("Failed to open VCF file {}: {}", path.display(), e))?;
        let header = reader.header();
        if header.sample_count() == 0 {
            return Err(format!("VCF file has no samples: {}", path.display()));
        }
        let sample = match sample {
            Some(name) => header.sample_id(name.as_bytes()).ok_or_else(|| {
                format!("Sample '{}' not found in {}", name, path.display())
            })?,
            None => {
                if header.sample_count() > 1 {
                    log::warn!(
                        "{} has {} samples, using the first one",
                        path.display(),
                        header.sample_count()
                    );
                }
                0
            }
        };
        let record = reader.empty_record();
        Ok(Self {
            reader,
            record,
            sample,
        })
    }

    fn decode(&self) -> CallRecord {
        let header = self.record.header();
        let chrom = match self.record.rid().map(|rid| header.rid2name(rid)) {
            Some(Ok(name)) => String::from_utf8_lossy(name).into_owned(),
            _ => return Err(SkipReason::Malformed),
        };
        let ids = self.record.id();
        let ids = String::from_utf8_lossy(&ids);
        // Multiple ids are `;`-separated; the first one is used for binning.
        let id = ids.split(';').next().unwrap_or_default();
        let position = (self.record.pos() + 1) as u64;

        let alleles = self.record.alleles();
        let genotypes = self
            .record
            .genotypes()
            .map_err(|_| SkipReason::Genotype)?;
        let mut letters = String::with_capacity(2);
        for gt_allele in genotypes.get(self.sample).iter() {
            let seq = gt_allele
                .index()
                .and_then(|i| alleles.get(i as usize))
                .ok_or(SkipReason::Genotype)?;
            match seq {
                [base] => letters.push(*base as char),
                _ => return Err(SkipReason::Genotype),
            }
        }
        GenotypeCall::parse(id, &chrom, position, &letters)
    }
}

impl Iterator for VcfCalls {
    type Item = Result<CallRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read(&mut self.record)? {
            Ok(()) => Some(Ok(self.decode())),
            Err(e) => Some(Err(format!("Error reading VCF record: {}", e))),
        }
    }
}
