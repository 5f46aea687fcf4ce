use super::GenotypeCall;
use crate::utils::{open_text_reader, GenomicRegion, Result};
use std::{collections::HashMap, io::BufRead, path::Path};

/// Region-of-interest intervals grouped by autosome, sorted by start.
#[derive(Debug, Default)]
pub struct RegionSet {
    by_chrom: HashMap<u8, Vec<GenomicRegion>>,
}

impl RegionSet {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        Self::from_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut by_chrom: HashMap<u8, Vec<GenomicRegion>> = HashMap::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.trim().is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }
            let region = GenomicRegion::from_bed_line(&line)
                .map_err(|e| format!("Line {}: {}", line_number + 1, e))?;
            if let Some(region) = region {
                by_chrom.entry(region.chrom).or_default().push(region);
            }
        }
        for regions in by_chrom.values_mut() {
            regions.sort_by_key(|r| (r.start, r.end));
        }
        Ok(Self { by_chrom })
    }

    pub fn len(&self) -> usize {
        self.by_chrom.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, chrom: u8, position: u64) -> bool {
        let Some(regions) = self.by_chrom.get(&chrom) else {
            return false;
        };
        // Regions may overlap, so scan back from the last region starting before `position`.
        let upper = regions.partition_point(|r| r.start < position);
        regions[..upper]
            .iter()
            .rev()
            .any(|r| r.contains(chrom, position))
    }
}

/// Drops calls outside the regions of interest and calls closer than
/// `min_distance` to the previously accepted call on the same chromosome.
#[derive(Debug, Default)]
pub struct CallFilter {
    regions: Option<RegionSet>,
    min_distance: u64,
    last_position: HashMap<u8, u64>,
}

impl CallFilter {
    pub fn new(regions: Option<RegionSet>, min_distance: u64) -> Self {
        Self {
            regions,
            min_distance,
            last_position: HashMap::new(),
        }
    }

    pub fn accept(&mut self, call: &GenotypeCall) -> bool {
        if let Some(regions) = &self.regions {
            if !regions.contains(call.chrom, call.position) {
                return false;
            }
        }
        if self.min_distance > 0 {
            if let Some(&last) = self.last_position.get(&call.chrom) {
                if call.position.abs_diff(last) < self.min_distance {
                    return false;
                }
            }
            self.last_position.insert(call.chrom, call.position);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Allele;
    use std::io::Cursor;

    fn call(chrom: u8, position: u64) -> GenotypeCall {
        GenotypeCall {
            variant: position,
            chrom,
            position,
            alleles: [Allele::A, Allele::G],
        }
    }

    #[test]
    fn region_set_from_reader() {
        let data = "\
track name=roi\n\
chr1\t100\t200\n\
chr1\t150\t400\n\
chrX\t0\t1000\n\
2\t10\t20\tlabel\n";
        let regions = RegionSet::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(regions.len(), 3);
        assert!(regions.contains(1, 101));
        assert!(regions.contains(1, 350));
        assert!(!regions.contains(1, 100));
        assert!(!regions.contains(1, 401));
        assert!(regions.contains(2, 15));
        assert!(!regions.contains(3, 15));
    }

    #[test]
    fn region_set_invalid_line_err() {
        let data = "chr1\t200\t100\n";
        assert!(RegionSet::from_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn filter_passes_everything_by_default() {
        let mut filter = CallFilter::default();
        assert!(filter.accept(&call(1, 100)));
        assert!(filter.accept(&call(1, 100)));
    }

    #[test]
    fn filter_enforces_min_distance_per_chromosome() {
        let mut filter = CallFilter::new(None, 1000);
        assert!(filter.accept(&call(1, 100)));
        assert!(!filter.accept(&call(1, 900)));
        assert!(filter.accept(&call(2, 950)));
        assert!(filter.accept(&call(1, 1100)));
        assert!(!filter.accept(&call(1, 2000)));
        assert!(filter.accept(&call(1, 2100)));
    }

    #[test]
    fn filter_applies_regions_before_distance() {
        let regions = RegionSet::from_reader(Cursor::new("1\t0\t500\n")).unwrap();
        let mut filter = CallFilter::new(Some(regions), 100);
        assert!(!filter.accept(&call(1, 600)));
        assert!(filter.accept(&call(1, 450)));
        assert!(!filter.accept(&call(1, 500)));
    }
}
