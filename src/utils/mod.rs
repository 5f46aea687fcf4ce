mod math;
mod readers;
mod region;
mod util;

pub use math::{mean_and_std, pearson};
pub use readers::{create_writer, open_text_reader, open_text_writer};
pub use region::{parse_autosome, GenomicRegion};
pub use util::{handle_error_and_exit, Result};
