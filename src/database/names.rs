//! Compact display names for a batch of input files.
//!
//! File names are split into components at `/`, `\` and `.`; the leading and
//! trailing components shared by every name are dropped and the differing
//! middle part (with its original separators) becomes the display name.

fn is_separator(c: char) -> bool {
    matches!(c, '/' | '\\' | '.')
}

/// Byte spans of the components of `name`.
fn component_spans(name: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in name.char_indices() {
        if is_separator(c) {
            spans.push((start, i));
            start = i + c.len_utf8();
        }
    }
    spans.push((start, name.len()));
    spans
}

/// Simplifies a batch of names. Falls back to the unmodified names when any
/// simplified name would be empty or two of them would collide.
pub fn simplify_names(names: &[String]) -> Vec<String> {
    let spans: Vec<Vec<(usize, usize)>> = names.iter().map(|n| component_spans(n)).collect();
    let component = |i: usize, k: usize| {
        let (start, end) = spans[i][k];
        &names[i][start..end]
    };
    let Some(min_len) = spans.iter().map(Vec::len).min() else {
        return Vec::new();
    };

    let shared_prefix = (0..min_len)
        .take_while(|&k| (1..names.len()).all(|i| component(i, k) == component(0, k)))
        .count();
    let shared_suffix = (0..min_len - shared_prefix)
        .take_while(|&k| {
            let last0 = spans[0].len() - 1 - k;
            (1..names.len()).all(|i| component(i, spans[i].len() - 1 - k) == component(0, last0))
        })
        .count();

    let simplified: Vec<String> = names
        .iter()
        .zip(&spans)
        .map(|(name, spans)| {
            let last = spans.len() - shared_suffix;
            if last <= shared_prefix {
                return String::new();
            }
            name[spans[shared_prefix].0..spans[last - 1].1].to_string()
        })
        .collect();

    let mut unique = simplified.clone();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() != simplified.len() || simplified.iter().any(String::is_empty) {
        log::debug!("Display names could not be simplified, using file names");
        return names.to_vec();
    }
    simplified
}
