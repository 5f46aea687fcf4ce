use crate::utils::Result;

/// Largest autosome number accepted for fingerprinting.
const MAX_AUTOSOME: u8 = 22;

/// Parses a chromosome name of the form `N` or `chrN` into an autosome number (1-22).
pub fn parse_autosome(name: &str) -> Option<u8> {
    let digits = name.strip_prefix("chr").unwrap_or(name);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match digits.parse::<u8>() {
        Ok(chrom) if (1..=MAX_AUTOSOME).contains(&chrom) => Some(chrom),
        _ => None,
    }
}

/// An autosomal BED interval, 0-based and half-open.
#[derive(Debug, PartialEq, Clone)]
pub struct GenomicRegion {
    pub chrom: u8,
    pub start: u64,
    pub end: u64,
}

impl GenomicRegion {
    pub fn new(chrom: u8, start: u64, end: u64) -> Result<Self> {
        if start >= end {
            return Err(format!("Invalid region: start {} >= end {}", start, end));
        }
        Ok(Self { chrom, start, end })
    }

    /// Decodes a BED line. Returns `Ok(None)` for regions outside the autosomes.
    pub fn from_bed_line(line: &str) -> Result<Option<Self>> {
        let error_msg = || format!("Invalid BED line: {}", line);
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(error_msg());
        }
        let start: u64 = fields[1].parse().map_err(|_| error_msg())?;
        let end: u64 = fields[2].parse().map_err(|_| error_msg())?;
        match parse_autosome(fields[0]) {
            Some(chrom) => Self::new(chrom, start, end).map(Some),
            None => Ok(None),
        }
    }

    /// Tests a 1-based position against the region.
    pub fn contains(&self, chrom: u8, position: u64) -> bool {
        chrom == self.chrom && position > self.start && position <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autosome_names_with_and_without_prefix() {
        assert_eq!(parse_autosome("1"), Some(1));
        assert_eq!(parse_autosome("chr22"), Some(22));
        assert_eq!(parse_autosome("chr23"), None);
        assert_eq!(parse_autosome("0"), None);
        assert_eq!(parse_autosome("X"), None);
        assert_eq!(parse_autosome("chrX"), None);
        assert_eq!(parse_autosome("chr"), None);
        assert_eq!(parse_autosome("+1"), None);
        assert_eq!(parse_autosome("MT"), None);
    }

    #[test]
    fn init_region_from_bed_line_ok() {
        let region = GenomicRegion::from_bed_line("chr1\t100\t200\tgene")
            .unwrap()
            .unwrap();
        assert_eq!(region, GenomicRegion::new(1, 100, 200).unwrap());
    }

    #[test]
    fn init_region_on_sex_chromosome_is_ignored() {
        assert_eq!(GenomicRegion::from_bed_line("chrX\t100\t200"), Ok(None));
    }

    #[test]
    fn init_region_from_invalid_line_err() {
        assert_eq!(
            GenomicRegion::from_bed_line("chr1\t100"),
            Err("Invalid BED line: chr1\t100".to_string())
        );
        assert!(GenomicRegion::from_bed_line("chr1\ta\t200").is_err());
    }

    #[test]
    fn init_region_from_invalid_interval_err() {
        assert_eq!(
            GenomicRegion::new(1, 200, 100),
            Err("Invalid region: start 200 >= end 100".to_string())
        );
    }

    #[test]
    fn contains_uses_one_based_positions() {
        let region = GenomicRegion::new(3, 100, 200).unwrap();
        assert!(!region.contains(3, 100));
        assert!(region.contains(3, 101));
        assert!(region.contains(3, 200));
        assert!(!region.contains(3, 201));
        assert!(!region.contains(4, 150));
    }
}
