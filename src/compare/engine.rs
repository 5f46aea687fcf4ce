//! All-against-all search over serialized fingerprint databases.
//!
//! An engine takes one or two `.fp` files and reports every pair of records
//! whose similarity reaches a threshold, identified by 1-based record numbers.

use crate::database::read_data_file;
use crate::utils::Result;
use rayon::prelude::*;
use std::{
    path::{Path, PathBuf},
    process::Command,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub query: usize,
    pub target: usize,
    pub score: f64,
}

impl Hit {
    /// Parses a `query<TAB>target<TAB>score` line.
    pub fn from_line(line: &str) -> Result<Self> {
        let error_msg = || format!("Expected 'query target score': {}", line);
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [query, target, score] = fields[..] else {
            return Err(error_msg());
        };
        Ok(Self {
            query: query.parse().map_err(|_| error_msg())?,
            target: target.parse().map_err(|_| error_msg())?,
            score: score.parse().map_err(|_| error_msg())?,
        })
    }
}

pub trait ComparisonEngine {
    /// Compares the records of `query` against those of `target`, or against
    /// each other when `target` is `None`.
    fn search(&self, query: &Path, target: Option<&Path>, min_score: f64) -> Result<Vec<Hit>>;
}

/// Runs an external comparison program as `<program> query.fp [target.fp]`,
/// reading hits from its standard output. The program applies its own
/// threshold; hits below `min_score` are dropped here as well.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    program: PathBuf,
}

impl ExternalEngine {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl ComparisonEngine for ExternalEngine {
    fn search(&self, query: &Path, target: Option<&Path>, min_score: f64) -> Result<Vec<Hit>> {
        let mut command = Command::new(&self.program);
        command.arg(query);
        if let Some(target) = target {
            command.arg(target);
        }
        log::debug!("Running {:?}", command);
        let output = command
            .output()
            .map_err(|e| format!("Failed to run {}: {}", self.program.display(), e))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut hits = Vec::new();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            match Hit::from_line(line) {
                Ok(hit) if hit.score >= min_score => hits.push(hit),
                Ok(_) => {}
                Err(e) => log::warn!("Ignoring engine output line: {}", e),
            }
        }
        Ok(hits)
    }
}

/// In-process engine scoring every pair with the Spearman coefficient.
#[derive(Debug, Clone, Default)]
pub struct NativeEngine;

/// Ranks centered and scaled by their sample deviation, so that the Pearson
/// coefficient of two records is their dot product divided by `n - 1`.
fn standardize_ranks(record: &[i32]) -> Vec<f64> {
    let n = record.len() as f64;
    let mean = record.iter().map(|&r| r as f64).sum::<f64>() / n;
    let var = record.iter().map(|&r| (r as f64 - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std = var.sqrt();
    record.iter().map(|&r| (r as f64 - mean) / std).collect()
}

fn standardized_correlation(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>() / (a.len() - 1) as f64
}

impl ComparisonEngine for NativeEngine {
    fn search(&self, query: &Path, target: Option<&Path>, min_score: f64) -> Result<Vec<Hit>> {
        let queries = read_data_file(query)?;
        let targets = match target {
            Some(path) => {
                let targets = read_data_file(path)?;
                if targets.width != queries.width {
                    return Err(format!(
                        "Record widths differ: {} has {}, {} has {}",
                        query.display(),
                        queries.width,
                        path.display(),
                        targets.width
                    ));
                }
                Some(targets)
            }
            None => None,
        };
        let queries: Vec<Vec<f64>> = queries.records.iter().map(|r| standardize_ranks(r)).collect();
        let targets: Option<Vec<Vec<f64>>> = targets
            .map(|t| t.records.iter().map(|r| standardize_ranks(r)).collect());
        log::info!(
            "Comparing {} query records against {} target records",
            queries.len(),
            targets.as_ref().map_or(queries.len(), Vec::len)
        );

        let hits = queries
            .par_iter()
            .enumerate()
            .flat_map_iter(|(i, q)| {
                let (pool, skip) = match &targets {
                    Some(targets) => (targets, 0),
                    None => (&queries, i + 1),
                };
                pool.iter()
                    .enumerate()
                    .skip(skip)
                    .filter_map(move |(j, t)| {
                        let score = standardized_correlation(q, t);
                        (score >= min_score).then_some(Hit {
                            query: i + 1,
                            target: j + 1,
                            score,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(hits)
    }
}
