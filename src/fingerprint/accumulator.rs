//! Streams genotype calls into raw fingerprints for several vector lengths at once.
//!

use super::{
    filter::CallFilter,
    genotype::{CallRecord, CallStats, GenotypeCall, SkipReason},
    reference::{AlleleFrequencies, ReferenceTable},
    Allele, Fingerprint,
};
use crate::utils::Result;

pub struct Accumulator {
    fingerprints: Vec<Fingerprint>,
    allele_count: u64,
    stats: CallStats,
}

impl Accumulator {
    /// `lengths` must be non-empty and contain no zero; duplicates are ignored.
    pub fn new(lengths: &[usize]) -> Self {
        let mut lengths = lengths.to_vec();
        lengths.sort_unstable();
        lengths.dedup();
        Self {
            fingerprints: lengths.into_iter().map(Fingerprint::zeros).collect(),
            allele_count: 0,
            stats: CallStats::default(),
        }
    }

    /// Adds one call: +1 per observed allele copy and minus the population
    /// frequency of every reference allele, all in the variant's bin.
    pub fn add(&mut self, call: &GenotypeCall, frequencies: &AlleleFrequencies) {
        for fingerprint in self.fingerprints.iter_mut() {
            let bin = fingerprint.bin(call.variant);
            for allele in call.alleles {
                fingerprint.get_mut(allele)[bin] += 1.0;
            }
            for allele in Allele::ALL {
                fingerprint.get_mut(allele)[bin] -= frequencies.get(allele);
            }
        }
        self.allele_count += 2;
        self.stats.accept();
    }

    /// Consumes a genotype stream. Skipped records are tallied; only I/O
    /// failures of the source abort.
    pub fn process<I>(
        &mut self,
        records: I,
        reference: &ReferenceTable,
        filter: &mut CallFilter,
    ) -> Result<()>
    where
        I: IntoIterator<Item = Result<CallRecord>>,
    {
        for record in records {
            let call = match record? {
                Ok(call) => call,
                Err(reason) => {
                    self.stats.skip(reason);
                    continue;
                }
            };
            if !filter.accept(&call) {
                self.stats.skip(SkipReason::Filtered);
                continue;
            }
            match reference.get(call.variant) {
                Some(frequencies) => self.add(&call, frequencies),
                None => self.stats.skip(SkipReason::UnknownVariant),
            }
        }
        Ok(())
    }

    pub fn allele_count(&self) -> u64 {
        self.allele_count
    }

    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    pub fn lengths(&self) -> Vec<usize> {
        self.fingerprints.iter().map(Fingerprint::length).collect()
    }

    pub fn into_fingerprints(self) -> Vec<Fingerprint> {
        self.fingerprints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::TsvCalls;
    use std::io::Cursor;

    const EPS: f64 = 1e-9;

    fn reference() -> ReferenceTable {
        [
            (1, AlleleFrequencies::new([0.3, 0.7, 0.0, 0.0])),
            (4, AlleleFrequencies::new([0.0, 0.0, 0.6, 0.5])),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn accumulate_repeated_heterozygous_call() {
        let data = "\
rs1\tchr1\t100\tAC\n\
rs1\tchr1\t100\tAC\n\
rs1\tchr1\t100\tAC\n";
        let mut acc = Accumulator::new(&[2]);
        acc.process(
            TsvCalls::new(Cursor::new(data)),
            &reference(),
            &mut CallFilter::default(),
        )
        .unwrap();
        assert_eq!(acc.allele_count(), 6);
        let fp = &acc.into_fingerprints()[0];
        assert!((fp.get(Allele::A)[1] - 2.1).abs() < EPS);
        assert!((fp.get(Allele::C)[1] - 0.9).abs() < EPS);
        assert_eq!(fp.get(Allele::G), &[0.0, 0.0]);
        assert_eq!(fp.get(Allele::A)[0], 0.0);
    }

    #[test]
    fn subtracts_every_reference_allele() {
        let mut acc = Accumulator::new(&[3, 5]);
        let call = GenotypeCall {
            variant: 4,
            chrom: 2,
            position: 10,
            alleles: [Allele::G, Allele::G],
        };
        acc.add(&call, reference().get(4).unwrap());
        for fp in acc.into_fingerprints() {
            let bin = fp.bin(4);
            assert!((fp.get(Allele::G)[bin] - 1.4).abs() < EPS);
            assert!((fp.get(Allele::T)[bin] + 0.5).abs() < EPS);
            let total: f64 = fp.fold().iter().sum();
            assert!((total - (2.0 - 1.1)).abs() < EPS);
        }
    }

    #[test]
    fn skipped_records_do_not_count() {
        let data = "\
rs1\t1\t100\tAC\n\
rs2\t1\t200\tAA\n\
rs4\tX\t300\tGT\n\
rs4\t5\t300\tG\n\
rs4\t5\t300\tGT\n";
        let mut acc = Accumulator::new(&[10]);
        acc.process(
            TsvCalls::new(Cursor::new(data)),
            &reference(),
            &mut CallFilter::default(),
        )
        .unwrap();
        assert_eq!(acc.allele_count(), 4);
        assert_eq!(acc.stats().accepted, 2);
        assert_eq!(acc.stats().skipped(SkipReason::UnknownVariant), 1);
        assert_eq!(acc.stats().skipped(SkipReason::Chromosome), 1);
        assert_eq!(acc.stats().skipped(SkipReason::Genotype), 1);
    }

    #[test]
    fn filtered_calls_are_tallied() {
        let data = "\
rs1\t1\t100\tAC\n\
rs4\t1\t150\tGT\n";
        let mut acc = Accumulator::new(&[10]);
        acc.process(
            TsvCalls::new(Cursor::new(data)),
            &reference(),
            &mut CallFilter::new(None, 1000),
        )
        .unwrap();
        assert_eq!(acc.allele_count(), 2);
        assert_eq!(acc.stats().skipped(SkipReason::Filtered), 1);
    }

    #[test]
    fn lengths_are_sorted_and_unique() {
        let acc = Accumulator::new(&[1000, 300, 1000]);
        assert_eq!(acc.lengths(), vec![300, 1000]);
    }
}
