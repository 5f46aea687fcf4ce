use crate::cli::CompareArgs;
use crate::compare::compare as compare_fingerprints;
use crate::fingerprint::FingerprintFile;
use crate::utils::{open_text_writer, Result};
use std::{
    io::{self, Write},
    path::Path,
};

pub fn compare(args: CompareArgs) -> Result<()> {
    let [path_a, path_b] = &args.fingerprint_paths[..] else {
        return Err("Expected exactly two fingerprint files".into());
    };
    let a = FingerprintFile::load(path_a)?;
    let b = FingerprintFile::load(path_b)?;

    let lengths = args.lengths.as_ref().map(|l| l.0.as_slice());
    let comparison = compare_fingerprints(&a, &b, lengths);
    if comparison.scores.is_empty() {
        log::warn!(
            "{} and {} share no vector length",
            path_a.display(),
            path_b.display()
        );
    }

    let mut writer: Box<dyn Write> = match &args.output_path {
        Some(path) => open_text_writer(Path::new(path))?,
        None => Box::new(io::stdout().lock()),
    };
    comparison
        .write(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| format!("Failed to write comparison: {}", e))
}
