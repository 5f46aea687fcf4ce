mod index;
mod names;
mod store;

pub use index::{DatabaseIndex, IndexEntry, IndexHeader};
pub use names::simplify_names;
pub use store::{
    data_path, index_path, open_index, read_data_file, read_record, DataFile, DatabaseLock,
    DatabaseWriter,
};

use crate::compare::fingerprint_ranks;
use crate::fingerprint::{Fingerprint, FingerprintFile};
use crate::utils::Result;

/// Appends normalized fingerprints of vector length `length` to the database
/// `base`, naming them by their simplified source file names. Individuals
/// already present are skipped. Returns the number of records added.
///
/// Every input must list `length` in its vector lengths and carry that
/// vector, whether or not it is already stored; otherwise nothing is written.
pub fn serialize_fingerprints(
    base: &str,
    length: usize,
    inputs: &[(String, FingerprintFile)],
) -> Result<usize> {
    let fingerprints = inputs
        .iter()
        .map(|(source, file)| fingerprint_of_length(source, file, length))
        .collect::<Result<Vec<_>>>()?;

    let mut writer = DatabaseWriter::open(base, length)?;
    let sources: Vec<String> = inputs.iter().map(|(source, _)| source.clone()).collect();
    let names = simplify_names(&sources);

    let mut added = 0;
    for ((source, fingerprint), name) in sources.iter().zip(fingerprints).zip(&names) {
        if writer.contains(name) {
            log::debug!("{} is already in the database, skipping", name);
            continue;
        }
        if writer.append(name, source, &fingerprint_ranks(fingerprint))? {
            log::debug!("Added {} as {}", source, name);
            added += 1;
        }
    }
    Ok(added)
}

fn fingerprint_of_length<'a>(
    source: &str,
    file: &'a FingerprintFile,
    length: usize,
) -> Result<&'a Fingerprint> {
    let missing = || {
        format!(
            "{} has no fingerprint of L={} (vectorLengths: {})",
            source,
            length,
            itertools::join(&file.meta.lengths, ",")
        )
    };
    if !file.meta.lengths.contains(&length) {
        return Err(missing());
    }
    file.get(length).ok_or_else(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{normalize, FingerprintMeta};
    use std::fs;

    fn fingerprint_file(lengths: &[usize], seed: f64) -> FingerprintFile {
        let fingerprints = lengths.iter().map(|&length| {
            let raw = Fingerprint::from_vectors(std::array::from_fn(|a| {
                (0..length)
                    .map(|i| ((i * 7 + a * 3) as f64 * seed).sin())
                    .collect()
            }))
            .unwrap();
            normalize(&raw)
        });
        let meta = FingerprintMeta {
            allele_count: Some(1000),
            lengths: lengths.to_vec(),
            ..Default::default()
        };
        FingerprintFile::new(meta, fingerprints)
    }

    fn inputs(seeds: &[(&str, f64)], lengths: &[usize]) -> Vec<(String, FingerprintFile)> {
        seeds
            .iter()
            .map(|&(source, seed)| (source.to_string(), fingerprint_file(lengths, seed)))
            .collect()
    }

    #[test]
    fn serialization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("db").to_string_lossy().into_owned();
        let batch = inputs(
            &[("fp/s.A.outn.gz", 0.3), ("fp/s.B.outn.gz", 1.7)],
            &[10, 20],
        );

        assert_eq!(serialize_fingerprints(&base, 10, &batch).unwrap(), 2);
        assert_eq!(serialize_fingerprints(&base, 10, &batch).unwrap(), 0);

        let index = open_index(&base).unwrap();
        let names: Vec<&str> = index.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        let size = fs::metadata(data_path(&base)).unwrap().len();
        assert_eq!((size - 4) / (4 * 10 * 4), index.len() as u64);
    }

    #[test]
    fn stored_records_are_rank_permutations() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("db").to_string_lossy().into_owned();
        let batch = inputs(&[("x/one.outn", 0.9), ("x/two.outn", 2.3)], &[25]);
        serialize_fingerprints(&base, 25, &batch).unwrap();

        let data = read_data_file(&data_path(&base)).unwrap();
        for record in &data.records {
            let mut sorted = record.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..100).collect::<Vec<i32>>());
        }
        let expected: Vec<i32> = fingerprint_ranks(batch[0].1.get(25).unwrap())
            .into_iter()
            .map(|r| r as i32)
            .collect();
        assert_eq!(data.records[0], expected);
    }

    #[test]
    fn missing_length_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("db").to_string_lossy().into_owned();
        let batch = inputs(&[("a.outn", 0.5), ("b.outn", 0.7)], &[300]);
        let err = serialize_fingerprints(&base, 1000, &batch).unwrap_err();
        assert!(err.contains("L=1000"));
        assert!(err.contains("vectorLengths: 300"));
    }

    #[test]
    fn missing_length_is_fatal_for_stored_names() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("db").to_string_lossy().into_owned();
        let stored = inputs(&[("d/s.A.outn", 0.5), ("d/s.B.outn", 0.7)], &[1000]);
        assert_eq!(serialize_fingerprints(&base, 1000, &stored).unwrap(), 2);

        let resent = inputs(&[("d/s.A.outn", 0.5), ("d/s.B.outn", 0.7)], &[300]);
        let err = serialize_fingerprints(&base, 1000, &resent).unwrap_err();
        assert!(err.contains("L=1000"));
        assert_eq!(open_index(&base).unwrap().len(), 2);
    }

    #[test]
    fn length_must_be_listed_in_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("db").to_string_lossy().into_owned();
        let mut batch = inputs(&[("a.outn", 0.5), ("b.outn", 0.7)], &[300, 1000]);
        batch[1].1.meta.lengths = vec![300];
        let err = serialize_fingerprints(&base, 1000, &batch).unwrap_err();
        assert!(err.contains("b.outn"));
        assert!(!data_path(&base).exists());
    }

    #[test]
    fn incompatible_database_length_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("db").to_string_lossy().into_owned();
        let batch = inputs(&[("a.outn", 0.5), ("b.outn", 0.7)], &[300, 1000]);
        serialize_fingerprints(&base, 1000, &batch).unwrap();
        assert!(serialize_fingerprints(&base, 300, &batch).is_err());
    }
}
