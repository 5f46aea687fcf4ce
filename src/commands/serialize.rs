use crate::cli::SerializeArgs;
use crate::database::{open_index, serialize_fingerprints};
use crate::fingerprint::FingerprintFile;
use crate::utils::Result;
use std::time;

pub fn serialize(args: SerializeArgs) -> Result<()> {
    let start_timer = time::Instant::now();

    let inputs = args
        .fingerprint_paths
        .iter()
        .map(|path| -> Result<(String, FingerprintFile)> {
            let file = FingerprintFile::load(path)?;
            Ok((path.to_string_lossy().into_owned(), file))
        })
        .collect::<Result<Vec<_>>>()?;

    let added = serialize_fingerprints(&args.database, args.length, &inputs)?;
    let total = open_index(&args.database)?.len();
    log::info!(
        "Added {} of {} fingerprints to {} ({} records)",
        added,
        inputs.len(),
        args.database,
        total
    );
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}
