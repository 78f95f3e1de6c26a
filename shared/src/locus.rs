//! Genomic loci and the free-text locus syntax accepted by goto gestures.
//!
//! Accepted forms:
//! - `All` for the genome overview
//! - `chr1` for a whole chromosome on both axes
//! - `chr1:1,000,001-2,000,000` for a range on both axes
//! - `chr1:1-100 chr2:500-900` for one range per axis
//!
//! Displayed starts are 1-based; parsed ranges are converted to 0-based
//! starts with exclusive ends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the whole-genome pseudo-chromosome.
pub const WHOLE_GENOME_NAME: &str = "All";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AxisLocus {
    pub chr: String,
    pub start: u64,
    pub end: u64,
}

impl fmt::Display for AxisLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}

/// Visible genomic extent per axis.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Locus {
    pub x: AxisLocus,
    pub y: AxisLocus,
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocusParseError {
    #[error("locus string is empty")]
    Empty,
    #[error("expected one or two loci, found {0}")]
    TooManyLoci(usize),
    #[error("invalid range `{0}`")]
    InvalidRange(String),
    #[error("invalid position `{0}`")]
    InvalidPosition(String),
}

/// One axis of a goto request; `range` is `None` for a whole chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocusTarget {
    pub chr: String,
    pub range: Option<(u64, u64)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocusQuery {
    WholeGenome,
    Loci { x: LocusTarget, y: LocusTarget },
}

impl FromStr for LocusQuery {
    type Err = LocusParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.as_slice() {
            [] => Err(LocusParseError::Empty),
            [single] if single.eq_ignore_ascii_case(WHOLE_GENOME_NAME) => Ok(LocusQuery::WholeGenome),
            [single] => {
                let target = parse_target(single)?;
                Ok(LocusQuery::Loci { x: target.clone(), y: target })
            }
            [x, y] => Ok(LocusQuery::Loci {
                x: parse_target(x)?,
                y: parse_target(y)?,
            }),
            more => Err(LocusParseError::TooManyLoci(more.len())),
        }
    }
}

fn parse_target(token: &str) -> Result<LocusTarget, LocusParseError> {
    let Some((chr, range)) = token.split_once(':') else {
        return Ok(LocusTarget { chr: token.to_string(), range: None });
    };
    if chr.is_empty() {
        return Err(LocusParseError::InvalidRange(token.to_string()));
    }
    let (start, end) = range
        .split_once('-')
        .ok_or_else(|| LocusParseError::InvalidRange(token.to_string()))?;
    let start = parse_position(start)?;
    let end = parse_position(end)?;
    if start == 0 || end < start {
        return Err(LocusParseError::InvalidRange(token.to_string()));
    }
    Ok(LocusTarget {
        chr: chr.to_string(),
        range: Some((start - 1, end)),
    })
}

fn parse_position(text: &str) -> Result<u64, LocusParseError> {
    let digits: String = text.chars().filter(|c| *c != ',').collect();
    digits
        .parse::<u64>()
        .map_err(|_| LocusParseError::InvalidPosition(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(chr: &str, range: Option<(u64, u64)>) -> LocusTarget {
        LocusTarget { chr: chr.to_string(), range }
    }

    #[test]
    fn parses_whole_genome_case_insensitively() {
        assert_eq!("all".parse::<LocusQuery>(), Ok(LocusQuery::WholeGenome));
        assert_eq!(" All ".parse::<LocusQuery>(), Ok(LocusQuery::WholeGenome));
    }

    #[test]
    fn single_locus_applies_to_both_axes() {
        let query: LocusQuery = "chr2:1,000,001-2,000,000".parse().unwrap();
        let expected = target("chr2", Some((1_000_000, 2_000_000)));
        assert_eq!(query, LocusQuery::Loci { x: expected.clone(), y: expected });
    }

    #[test]
    fn bare_chromosome_means_whole_chromosome() {
        let query: LocusQuery = "chrX chr3:1-10".parse().unwrap();
        assert_eq!(
            query,
            LocusQuery::Loci {
                x: target("chrX", None),
                y: target("chr3", Some((0, 10))),
            }
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<LocusQuery>(), Err(LocusParseError::Empty));
        assert_eq!(
            "chr1 chr2 chr3".parse::<LocusQuery>(),
            Err(LocusParseError::TooManyLoci(3))
        );
        assert!(matches!(
            "chr1:500".parse::<LocusQuery>(),
            Err(LocusParseError::InvalidRange(_))
        ));
        assert!(matches!(
            "chr1:900-100".parse::<LocusQuery>(),
            Err(LocusParseError::InvalidRange(_))
        ));
        assert!(matches!(
            "chr1:1k-2k".parse::<LocusQuery>(),
            Err(LocusParseError::InvalidPosition(_))
        ));
    }

    #[test]
    fn displays_one_based_ranges() {
        let locus = Locus {
            x: AxisLocus { chr: "chr1".into(), start: 1, end: 500 },
            y: AxisLocus { chr: "chr2".into(), start: 11, end: 20 },
        };
        assert_eq!(locus.to_string(), "chr1:1-500 chr2:11-20");
    }
}
