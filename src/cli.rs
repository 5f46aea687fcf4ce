use crate::fingerprint::InputFormat;
use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="gfp",
          version=&**FULL_VERSION,
          about="Genome fingerprints: compact genotype summaries for identity and relatedness screening",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Compute the fingerprint of one individual")]
    Fingerprint(FingerprintArgs),
    #[clap(about = "Compare two fingerprints")]
    Compare(CompareArgs),
    #[clap(about = "Add fingerprints to a database")]
    Serialize(SerializeArgs),
    #[clap(about = "Search fingerprint databases for similar individuals")]
    Search(SearchArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("fingerprint")))]
#[command(arg_required_else_help(true))]
pub struct FingerprintArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "Genotype file (VCF/BCF or tab-delimited rsid, chrom, pos, genotype)")]
    #[clap(value_name = "GENOTYPES")]
    #[arg(value_parser = check_file_exists)]
    pub input_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reference")]
    #[clap(help = "Reference allele frequency table")]
    #[clap(value_name = "FREQUENCIES")]
    #[arg(value_parser = check_file_exists)]
    pub reference_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 'l')]
    #[clap(long = "lengths")]
    #[clap(help = "Comma-separated vector lengths")]
    #[clap(value_name = "LENGTHS")]
    #[clap(default_value = "300,1000,3000")]
    #[arg(value_parser = lengths_from_string)]
    pub lengths: Lengths,

    #[clap(short = 'f')]
    #[clap(long = "format")]
    #[clap(value_name = "FORMAT")]
    #[clap(help = "Genotype input format (auto, tsv or vcf)")]
    #[clap(default_value = "auto")]
    pub format: InputFormat,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "sample")]
    #[clap(value_name = "SAMPLE_NAME")]
    #[clap(help = "Sample to use from a multi-sample VCF")]
    #[arg(value_parser = check_sample_name_nonempty)]
    pub sample_name: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(short = 'd')]
    #[clap(long = "min-distance")]
    #[clap(value_name = "BP")]
    #[clap(help = "Skip calls closer than this to the previous call on the same chromosome")]
    #[clap(default_value = "0")]
    pub min_distance: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "regions")]
    #[clap(value_name = "BED")]
    #[clap(help = "Only use calls inside these regions")]
    #[arg(value_parser = check_file_exists)]
    pub regions_path: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("compare")))]
#[command(arg_required_else_help(true))]
pub struct CompareArgs {
    #[clap(required = true)]
    #[clap(help = "Normalized fingerprint files (.outn)")]
    #[clap(value_name = "FINGERPRINT")]
    #[clap(num_args = 2)]
    #[arg(value_parser = check_file_exists)]
    pub fingerprint_paths: Vec<PathBuf>,

    #[clap(short = 'l')]
    #[clap(long = "lengths")]
    #[clap(help = "Only report these comma-separated vector lengths")]
    #[clap(value_name = "LENGTHS")]
    #[arg(value_parser = lengths_from_string)]
    pub lengths: Option<Lengths>,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output file (default: standard output)")]
    #[clap(value_name = "OUTPUT")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: Option<String>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("serialize")))]
#[command(arg_required_else_help(true))]
pub struct SerializeArgs {
    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "database")]
    #[clap(help = "Database base name (writes <DATABASE>.fp and <DATABASE>.id)")]
    #[clap(value_name = "DATABASE")]
    #[arg(value_parser = check_prefix_path)]
    pub database: String,

    #[clap(short = 'l')]
    #[clap(long = "length")]
    #[clap(help = "Vector length stored in the database")]
    #[clap(value_name = "LENGTH")]
    #[clap(default_value = "1000")]
    #[arg(value_parser = length_in_range)]
    pub length: usize,

    #[clap(required = true)]
    #[clap(help = "Normalized fingerprint files (.outn)")]
    #[clap(value_name = "FINGERPRINT")]
    #[arg(value_parser = check_file_exists)]
    pub fingerprint_paths: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("search")))]
#[command(arg_required_else_help(true))]
pub struct SearchArgs {
    #[clap(required = true)]
    #[clap(short = 'q')]
    #[clap(long = "query")]
    #[clap(help = "Query database base name")]
    #[clap(value_name = "DATABASE")]
    pub query: String,

    #[clap(short = 't')]
    #[clap(long = "target")]
    #[clap(help = "Target database base name (default: compare the query database with itself)")]
    #[clap(value_name = "DATABASE")]
    pub target: Option<String>,

    #[clap(long = "min-score")]
    #[clap(value_name = "SCORE")]
    #[clap(help = "Minimum similarity score to report")]
    #[clap(default_value = "0.5")]
    #[arg(value_parser = ensure_correlation)]
    pub min_score: f64,

    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output file (default: standard output)")]
    #[clap(value_name = "OUTPUT")]
    #[arg(value_parser = check_prefix_path)]
    pub output_path: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "engine-cmd")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help = "External comparison engine (default: built-in engine)")]
    pub engine_cmd: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(short = '@')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads for the built-in engine")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,
}

/// Vector lengths as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Lengths(pub Vec<usize>);

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_sample_name_nonempty(s: &str) -> Result<String> {
    if s.trim().is_empty() {
        Err("Sample name cannot be an empty string".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn ensure_correlation(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(-1.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between -1.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn length_in_range(s: &str) -> Result<usize> {
    let length: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a valid vector length", s))?;
    if length == 0 {
        return Err("Vector length must be at least 1".into());
    }
    Ok(length)
}

fn lengths_from_string(s: &str) -> Result<Lengths> {
    let lengths = s
        .split(',')
        .map(length_in_range)
        .collect::<Result<Vec<_>>>()?;
    if lengths.is_empty() {
        return Err("Expected at least one vector length".into());
    }
    Ok(Lengths(lengths))
}
