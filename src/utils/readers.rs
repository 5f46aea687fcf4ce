use super::Result;
use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read as ioRead, Write as ioWrite};
use std::path::Path;

fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

/// Opens a plain or gzip-compressed text file, picking the decoder from the extension.
pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

/// Creates a text file for writing, gzip-compressing it when the path ends in `.gz`.
pub fn open_text_writer(path: &Path) -> Result<Box<dyn ioWrite>> {
    let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        Ok(Box::new(GzEncoder::new(
            BufWriter::new(file),
            Compression::default(),
        )))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

pub fn create_writer<T, F>(output_prefix: &str, output_suffix: &str, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    f(Path::new(&output_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;

    #[test]
    fn gzip_writer_output_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.tsv.gz");
        {
            let mut writer = open_text_writer(&path).unwrap();
            writeln!(writer, "rs1\tA\t0.3").unwrap();
            writeln!(writer, "rs2\tC\t0.9").unwrap();
        }
        let lines: Vec<String> = open_text_reader(&path)
            .unwrap()
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["rs1\tA\t0.3", "rs2\tC\t0.9"]);
    }

    #[test]
    fn plain_file_with_gz_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.gz");
        std::fs::write(&path, "not compressed\n").unwrap();
        assert!(open_text_reader(&path).is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = open_text_reader(Path::new("/nonexistent/freqs.tsv"))
            .err()
            .unwrap();
        assert!(err.contains("/nonexistent/freqs.tsv"));
    }

    #[test]
    fn create_writer_joins_prefix_and_suffix() {
        let path = create_writer("out/sample", "outn.gz", |p| Ok(p.to_path_buf())).unwrap();
        assert_eq!(path, Path::new("out/sample.outn.gz"));
    }
}
