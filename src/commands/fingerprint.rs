use crate::cli::FingerprintArgs;
use crate::fingerprint::{
    normalize, open_calls, Accumulator, CallFilter, FingerprintFile, FingerprintMeta,
    ReferenceTable, RegionSet,
};
use crate::utils::{create_writer, Result};
use std::time;

pub fn fingerprint(args: FingerprintArgs) -> Result<()> {
    let start_timer = time::Instant::now();

    let reference = ReferenceTable::load(&args.reference_path)?;
    if reference.is_empty() {
        return Err(format!(
            "No variants in reference table {}",
            args.reference_path.display()
        ));
    }

    let regions = match &args.regions_path {
        Some(path) => {
            let regions = RegionSet::load(path)?;
            log::info!("Restricting calls to {} regions", regions.len());
            Some(regions)
        }
        None => None,
    };
    let mut filter = CallFilter::new(regions, args.min_distance);

    let calls = open_calls(&args.input_path, args.format, args.sample_name.as_deref())?;
    let mut accumulator = Accumulator::new(&args.lengths.0);
    accumulator.process(calls, &reference, &mut filter)?;
    accumulator.stats().log_summary();
    if accumulator.allele_count() == 0 {
        log::warn!(
            "No genotype calls of {} matched the reference table",
            args.input_path.display()
        );
    }

    let meta = FingerprintMeta::new(
        &args.input_path.to_string_lossy(),
        accumulator.allele_count(),
        accumulator.lengths(),
    );
    let raw = FingerprintFile::new(meta, accumulator.into_fingerprints());
    create_writer(&args.output_prefix, "out.gz", |path| raw.save(path))?;

    let normalized = raw.map(normalize);
    create_writer(&args.output_prefix, "outn.gz", |path| normalized.save(path))?;

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}
