use super::{Allele, Fingerprint};
use crate::utils::mean_and_std;

/// Standardizes `values` in place. A zero (or non-finite) deviation only
/// centers; fewer than two values leaves the data untouched.
fn standardize(values: &mut [f64]) {
    let Some((mean, std)) = mean_and_std(values) else {
        return;
    };
    let std = if std == 0.0 || !std.is_finite() { 1.0 } else { std };
    for value in values.iter_mut() {
        *value = (*value - mean) / std;
    }
}

/// Two-pass z-score normalization: first across the four alleles of every
/// bin, then across the bins of every allele. The second pass runs on the
/// output of the first.
pub fn normalize(raw: &Fingerprint) -> Fingerprint {
    let mut fingerprint = raw.clone();
    let length = fingerprint.length();

    let mut column = [0.0; 4];
    for bin in 0..length {
        for allele in Allele::ALL {
            column[allele.index()] = fingerprint.get(allele)[bin];
        }
        standardize(&mut column);
        for allele in Allele::ALL {
            fingerprint.get_mut(allele)[bin] = column[allele.index()];
        }
    }

    for allele in Allele::ALL {
        standardize(fingerprint.get_mut(allele));
    }
    fingerprint
}
