use super::rank_transform;
use crate::fingerprint::{Fingerprint, FingerprintFile};
use crate::utils::pearson;
use std::io::Write;

/// Spearman correlation of two rank vectors (Pearson correlation on ranks).
pub fn spearman(ranks_a: &[u32], ranks_b: &[u32]) -> Option<f64> {
    let a: Vec<f64> = ranks_a.iter().map(|&r| r as f64).collect();
    let b: Vec<f64> = ranks_b.iter().map(|&r| r as f64).collect();
    pearson(&a, &b)
}

/// Folds a fingerprint and replaces the values by their ranks.
pub fn fingerprint_ranks(fingerprint: &Fingerprint) -> Vec<u32> {
    rank_transform(&fingerprint.fold())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LengthScore {
    pub length: usize,
    pub rho: Option<f64>,
}

/// Similarity of two individuals over the vector lengths they share.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub sources: (String, String),
    pub allele_counts: (Option<u64>, Option<u64>),
    pub scores: Vec<LengthScore>,
}

/// Scores every vector length present in both files (and in `lengths`, when given).
pub fn compare(a: &FingerprintFile, b: &FingerprintFile, lengths: Option<&[usize]>) -> Comparison {
    let scores = a
        .fingerprints
        .iter()
        .filter(|(length, _)| lengths.map_or(true, |wanted| wanted.contains(*length)))
        .filter_map(|(&length, fp_a)| {
            let fp_b = b.get(length)?;
            Some(LengthScore {
                length,
                rho: spearman(&fingerprint_ranks(fp_a), &fingerprint_ranks(fp_b)),
            })
        })
        .collect();
    Comparison {
        sources: (a.meta.source.clone(), b.meta.source.clone()),
        allele_counts: (a.meta.allele_count, b.meta.allele_count),
        scores,
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "NA".to_string(), |v| v.to_string())
}

impl Comparison {
    /// Writes the comparison table; the header is emitted even when no length is shared.
    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "#fingerprint1\t{}", self.sources.0)?;
        writeln!(writer, "#fingerprint2\t{}", self.sources.1)?;
        writeln!(
            writer,
            "#alleleCount\t{}\t{}",
            or_na(self.allele_counts.0),
            or_na(self.allele_counts.1)
        )?;
        writeln!(writer, "L\trho")?;
        for score in &self.scores {
            writeln!(
                writer,
                "{}\t{}",
                score.length,
                or_na(score.rho.map(|rho| format!("{:.6}", rho)))
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{normalize, Allele, FingerprintMeta};
    use rand::Rng;

    const EPS: f64 = 1e-9;

    fn random_file(source: &str, lengths: &[usize], allele_count: Option<u64>) -> FingerprintFile {
        let mut rng = rand::rng();
        let fingerprints: Vec<Fingerprint> = lengths
            .iter()
            .map(|&length| {
                let raw = Fingerprint::from_vectors(std::array::from_fn(|_| {
                    (0..length).map(|_| rng.random_range(-5.0..5.0)).collect()
                }))
                .unwrap();
                normalize(&raw)
            })
            .collect();
        let meta = FingerprintMeta {
            source: source.to_string(),
            allele_count,
            lengths: lengths.to_vec(),
            ..Default::default()
        };
        FingerprintFile::new(meta, fingerprints)
    }

    #[test]
    fn spearman_of_identical_and_reversed_ranks() {
        let ranks: [u32; 5] = [3, 0, 2, 1, 4];
        let reversed: Vec<u32> = ranks.iter().map(|r| 4 - r).collect();
        assert!((spearman(&ranks, &ranks).unwrap() - 1.0).abs() < EPS);
        assert!((spearman(&ranks, &reversed).unwrap() + 1.0).abs() < EPS);
        assert_eq!(spearman(&[0], &[0]), None);
    }

    #[test]
    fn self_comparison_is_one() {
        let file = random_file("x", &[10, 25], Some(100));
        let comparison = compare(&file, &file, None);
        assert_eq!(comparison.scores.len(), 2);
        for score in comparison.scores {
            assert!((score.rho.unwrap() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn comparison_is_symmetric() {
        let a = random_file("a", &[10, 30], Some(10));
        let b = random_file("b", &[10, 30], Some(20));
        let ab = compare(&a, &b, None);
        let ba = compare(&b, &a, None);
        for (x, y) in ab.scores.iter().zip(&ba.scores) {
            assert_eq!(x.length, y.length);
            assert!((x.rho.unwrap() - y.rho.unwrap()).abs() < EPS);
        }
    }

    #[test]
    fn only_shared_and_requested_lengths_are_scored() {
        let a = random_file("a", &[10, 20, 30], None);
        let b = random_file("b", &[20, 30, 40], Some(8));
        let all: Vec<usize> = compare(&a, &b, None).scores.iter().map(|s| s.length).collect();
        assert_eq!(all, vec![20, 30]);
        let some: Vec<usize> = compare(&a, &b, Some(&[30, 40][..]))
            .scores
            .iter()
            .map(|s| s.length)
            .collect();
        assert_eq!(some, vec![30]);
    }

    #[test]
    fn no_shared_length_still_writes_coverage() {
        let a = random_file("a.outn", &[10], None);
        let b = random_file("b.outn", &[20], Some(8));
        let comparison = compare(&a, &b, None);
        assert!(comparison.scores.is_empty());
        let mut buffer = Vec::new();
        comparison.write(&mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "#fingerprint1\ta.outn\n#fingerprint2\tb.outn\n#alleleCount\tNA\t8\nL\trho\n"
        );
    }

    #[test]
    fn folding_order_matters_for_ranks() {
        let mut fp = Fingerprint::zeros(1);
        fp.get_mut(Allele::A)[0] = 3.0;
        fp.get_mut(Allele::C)[0] = 1.0;
        fp.get_mut(Allele::G)[0] = 2.0;
        fp.get_mut(Allele::T)[0] = 0.0;
        assert_eq!(fingerprint_ranks(&fp), vec![3, 1, 2, 0]);
    }
}
