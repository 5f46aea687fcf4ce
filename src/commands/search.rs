use crate::cli::SearchArgs;
use crate::compare::{ComparisonEngine, ExternalEngine, Hit, NativeEngine};
use crate::database::{data_path, open_index, DatabaseIndex};
use crate::utils::{open_text_writer, Result};
use rayon::ThreadPoolBuilder;
use std::{
    io::{self, Write},
    path::Path,
    time,
};

pub fn search(args: SearchArgs) -> Result<()> {
    let start_timer = time::Instant::now();

    let query_index = open_index(&args.query)?;
    let target_index = match &args.target {
        Some(target) => {
            let index = open_index(target)?;
            if index.header.length != query_index.header.length {
                return Err(format!(
                    "Vector lengths differ: {} has L={}, {} has L={}",
                    args.query, query_index.header.length, target, index.header.length
                ));
            }
            Some(index)
        }
        None => None,
    };

    let query_path = data_path(&args.query);
    let target_path = args.target.as_deref().map(data_path);
    let hits = match &args.engine_cmd {
        Some(program) => ExternalEngine::new(program.clone()).search(
            &query_path,
            target_path.as_deref(),
            args.min_score,
        )?,
        None => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(args.num_threads)
                .thread_name(|i| format!("gfp-{}", i))
                .build()
                .map_err(|e| format!("Failed to build thread pool: {}", e))?;
            pool.install(|| {
                NativeEngine.search(&query_path, target_path.as_deref(), args.min_score)
            })?
        }
    };
    log::info!("Found {} hits with score >= {}", hits.len(), args.min_score);

    let mut writer: Box<dyn Write> = match &args.output_path {
        Some(path) => open_text_writer(Path::new(path))?,
        None => Box::new(io::stdout().lock()),
    };
    let targets = target_index.as_ref().unwrap_or(&query_index);
    write_hits(&mut writer, &hits, &query_index, targets)
        .map_err(|e| format!("Failed to write hits: {}", e))?;

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

fn write_hits<W: Write + ?Sized>(
    writer: &mut W,
    hits: &[Hit],
    queries: &DatabaseIndex,
    targets: &DatabaseIndex,
) -> io::Result<()> {
    for hit in hits {
        match (queries.name_of(hit.query), targets.name_of(hit.target)) {
            (Some(query), Some(target)) => {
                writeln!(writer, "{}\t{}\t{:.6}", query, target, hit.score)?
            }
            _ => log::warn!(
                "Hit ({}, {}) refers to a record outside the database",
                hit.query,
                hit.target
            ),
        }
    }
    writer.flush()
}
