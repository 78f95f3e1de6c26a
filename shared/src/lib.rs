use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod coordinates;
pub mod locus;

pub use config::{AppConfig, AppSection, ConfigError, MigrationStrategy, ViewerSection};
pub use coordinates::{
    DEFAULT_PIXEL_SIZE, GenomicRange, MAX_PIXEL_SIZE, WHOLE_GENOME_MAX_PIXEL_SIZE,
    find_matching_zoom_index,
};
pub use locus::{AxisLocus, Locus, LocusParseError, LocusQuery, LocusTarget, WHOLE_GENOME_NAME};

// ===== GENOME TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    pub index: usize,
    pub name: String,
    pub length_bp: u64,
}

impl Chromosome {
    pub fn is_whole_genome(&self) -> bool {
        self.name.eq_ignore_ascii_case(WHOLE_GENOME_NAME)
    }
}

// ===== MATRIX TYPES =====

/// Normalization label passed through to the matrix provider uninterpreted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Normalization(String);

impl Normalization {
    pub const NONE: &'static str = "NONE";

    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        if label.trim().is_empty() {
            Self::default()
        } else {
            Self(label)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Self(Self::NONE.to_string())
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Normalization {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

// ===== VIEWPORT TYPES =====

/// Pixel dimensions of the contact-matrix viewport.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ViewDimensions {
    pub width: f64,
    pub height: f64,
}

impl ViewDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for ViewDimensions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
        }
    }
}

// ===== SYNC TYPES =====

/// Navigation state exchanged between synchronized viewers.
///
/// Chromosomes travel by name and the zoom by bin size so peers with a
/// different chromosome ordering or resolution ladder can map it locally.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SyncState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genome_id: Option<String>,
    pub chr1_name: String,
    pub chr2_name: String,
    pub bin_size_bp: u64,
    pub bin_x: f64,
    pub bin_y: f64,
    pub pixel_size: f64,
}

impl SyncState {
    pub fn bp_per_pixel(&self) -> f64 {
        self.bin_size_bp as f64 / self.pixel_size
    }
}

// ===== UTILITY FUNCTIONS =====

pub fn find_chromosome<'a>(chromosomes: &'a [Chromosome], name: &str) -> Option<&'a Chromosome> {
    chromosomes
        .iter()
        .find(|chromosome| chromosome.name == name)
        .or_else(|| {
            // "chr1" and "1" name the same chromosome across assemblies
            let bare = strip_chr_prefix(name);
            chromosomes
                .iter()
                .find(|chromosome| strip_chr_prefix(&chromosome.name).eq_ignore_ascii_case(bare))
        })
}

fn strip_chr_prefix(name: &str) -> &str {
    name.strip_prefix("chr").unwrap_or(name)
}
