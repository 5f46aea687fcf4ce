use super::Allele;

/// Per-allele deviation vectors for one vector length `L`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    length: usize,
    values: [Vec<f64>; 4],
}

impl Fingerprint {
    pub fn zeros(length: usize) -> Self {
        Self {
            length,
            values: std::array::from_fn(|_| vec![0.0; length]),
        }
    }

    /// Builds a fingerprint from four vectors given in `Allele::ALL` order.
    /// Returns `None` unless all vectors have the same length.
    pub fn from_vectors(values: [Vec<f64>; 4]) -> Option<Self> {
        let length = values[0].len();
        if values.iter().any(|v| v.len() != length) {
            return None;
        }
        Some(Self { length, values })
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn bin(&self, variant: u64) -> usize {
        (variant % self.length as u64) as usize
    }

    pub fn get(&self, allele: Allele) -> &[f64] {
        &self.values[allele.index()]
    }

    pub fn get_mut(&mut self, allele: Allele) -> &mut [f64] {
        &mut self.values[allele.index()]
    }

    /// Concatenates the four vectors in folding order into one of length `4L`.
    pub fn fold(&self) -> Vec<f64> {
        let mut folded = Vec::with_capacity(4 * self.length);
        for allele in Allele::ALL {
            folded.extend_from_slice(self.get(allele));
        }
        folded
    }
}
