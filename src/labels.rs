use crate::error::{ChespiError, ChespiResult};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount, EnumIter, EnumString};

/// DSSP 8-class code. Discriminants follow the `HGIE-TSB` column order used
/// by every per-label table in the crate.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumCount,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum Ss8 {
    #[strum(serialize = "H")]
    #[serde(rename = "H")]
    AlphaHelix = 0,
    #[strum(serialize = "G")]
    #[serde(rename = "G")]
    ThreeTen = 1,
    #[strum(serialize = "I")]
    #[serde(rename = "I")]
    PiHelix = 2,
    #[strum(serialize = "E")]
    #[serde(rename = "E")]
    Strand = 3,
    #[strum(serialize = "-")]
    #[serde(rename = "-")]
    Loop = 4,
    #[strum(serialize = "T")]
    #[serde(rename = "T")]
    Turn = 5,
    #[strum(serialize = "S")]
    #[serde(rename = "S")]
    Bend = 6,
    #[strum(serialize = "B")]
    #[serde(rename = "B")]
    Bridge = 7,
}

/// Coarse helix / strand / coil grouping.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumCount,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
pub enum Ss3 {
    #[strum(serialize = "H")]
    #[serde(rename = "H")]
    Helix = 0,
    #[strum(serialize = "S")]
    #[serde(rename = "S")]
    Strand = 1,
    #[strum(serialize = "C")]
    #[serde(rename = "C")]
    Coil = 2,
}

/// Coil labels in sampling order.
pub const COIL_LABELS: [Ss8; 4] = [Ss8::Loop, Ss8::Turn, Ss8::Bend, Ss8::Bridge];

impl Ss8 {
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Ss8> {
        Ss8::iter().nth(i)
    }

    #[inline(always)]
    pub fn class(self) -> Ss3 {
        match self {
            Ss8::AlphaHelix | Ss8::ThreeTen | Ss8::PiHelix => Ss3::Helix,
            Ss8::Strand => Ss3::Strand,
            Ss8::Loop | Ss8::Turn | Ss8::Bend | Ss8::Bridge => Ss3::Coil,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Ss8::AlphaHelix => 'H',
            Ss8::ThreeTen => 'G',
            Ss8::PiHelix => 'I',
            Ss8::Strand => 'E',
            Ss8::Loop => '-',
            Ss8::Turn => 'T',
            Ss8::Bend => 'S',
            Ss8::Bridge => 'B',
        }
    }

    /// Accepts the DSSP symbols plus `C`, `L` and space as loop.
    pub fn from_symbol(c: char) -> Option<Ss8> {
        match c {
            'H' => Some(Ss8::AlphaHelix),
            'G' => Some(Ss8::ThreeTen),
            'I' => Some(Ss8::PiHelix),
            'E' => Some(Ss8::Strand),
            '-' | 'C' | 'L' | ' ' => Some(Ss8::Loop),
            'T' => Some(Ss8::Turn),
            'S' => Some(Ss8::Bend),
            'B' => Some(Ss8::Bridge),
            _ => None,
        }
    }
}

impl Ss3 {
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn symbol(self) -> char {
        match self {
            Ss3::Helix => 'H',
            Ss3::Strand => 'S',
            Ss3::Coil => 'C',
        }
    }

    pub fn from_symbol(c: char) -> Option<Ss3> {
        match c {
            'H' => Some(Ss3::Helix),
            'S' | 'E' => Some(Ss3::Strand),
            'C' | '-' => Some(Ss3::Coil),
            _ => None,
        }
    }

    /// Label written into a residue that joins a structured element.
    pub fn canonical_label(self) -> Ss8 {
        match self {
            Ss3::Helix => Ss8::AlphaHelix,
            Ss3::Strand => Ss8::Strand,
            Ss3::Coil => Ss8::Loop,
        }
    }
}

pub fn parse_ss8(s: &str) -> ChespiResult<Vec<Ss8>> {
    s.chars()
        .map(|c| {
            Ss8::from_symbol(c).ok_or_else(|| {
                ChespiError::Input(format!("'{}' is not an 8-class secondary structure code", c))
            })
        })
        .collect()
}

pub fn parse_ss3(s: &str) -> ChespiResult<Vec<Ss3>> {
    s.chars()
        .map(|c| {
            Ss3::from_symbol(c).ok_or_else(|| {
                ChespiError::Input(format!("'{}' is not a 3-class secondary structure code", c))
            })
        })
        .collect()
}

pub fn ss8_string(labels: &[Ss8]) -> String {
    labels.iter().map(|l| l.symbol()).collect()
}

pub fn ss3_string(labels: &[Ss3]) -> String {
    labels.iter().map(|l| l.symbol()).collect()
}

pub fn collapse(labels: &[Ss8]) -> Vec<Ss3> {
    labels.iter().map(|l| l.class()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_column_order_is_hgie_tsb() {
        let order: String = Ss8::iter().map(|l| l.symbol()).collect();
        assert_eq!(order, "HGIE-TSB");
        for (i, l) in Ss8::iter().enumerate() {
            assert_eq!(l.index(), i);
            assert_eq!(Ss8::from_index(i), Some(l));
        }
    }

    #[test]
    fn test_class_mapping() {
        assert_eq!(ss3_string(&collapse(&parse_ss8("HGIE-TSB").unwrap())), "HHHSCCCC");
    }

    #[test]
    fn test_strum_round_trip() {
        for l in Ss8::iter() {
            assert_eq!(Ss8::from_str(&l.to_string()).unwrap(), l);
        }
        assert_eq!(Ss3::from_str("C").unwrap(), Ss3::Coil);
    }

    #[test]
    fn test_rejects_unknown_symbol() {
        assert!(parse_ss8("HHX").is_err());
        assert!(parse_ss3("HQ").is_err());
    }
}
