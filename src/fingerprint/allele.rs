use std::{fmt, str::FromStr};

/// Nucleotide letter tracked by a fingerprint.
///
/// The declaration order is the folding order used when the four per-allele
/// vectors are concatenated, both on disk and for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Allele {
    A,
    C,
    G,
    T,
}

impl Allele {
    pub const ALL: [Allele; 4] = [Allele::A, Allele::C, Allele::G, Allele::T];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_byte(base: u8) -> Option<Self> {
        match base.to_ascii_uppercase() {
            b'A' => Some(Allele::A),
            b'C' => Some(Allele::C),
            b'G' => Some(Allele::G),
            b'T' => Some(Allele::T),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Allele::A => 'A',
            Allele::C => 'C',
            Allele::G => 'G',
            Allele::T => 'T',
        }
    }
}

impl FromStr for Allele {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [base] => Allele::from_byte(*base).ok_or_else(|| format!("Invalid allele: {}", s)),
            _ => Err(format!("Invalid allele: {}", s)),
        }
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folding_order_is_alphabetical() {
        let mut letters: Vec<char> = Allele::ALL.iter().map(|a| a.as_char()).collect();
        let declared = letters.clone();
        letters.sort();
        assert_eq!(letters, declared);
        for (i, allele) in Allele::ALL.iter().enumerate() {
            assert_eq!(allele.index(), i);
        }
    }

    #[test]
    fn parse_alleles() {
        assert_eq!("G".parse::<Allele>(), Ok(Allele::G));
        assert_eq!(Allele::from_byte(b't'), Some(Allele::T));
        assert!("N".parse::<Allele>().is_err());
        assert!("AC".parse::<Allele>().is_err());
        assert!("".parse::<Allele>().is_err());
        assert_eq!(Allele::from_byte(b'-'), None);
    }
}
