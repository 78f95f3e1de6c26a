//! Coordinate transforms between bin space, pixel space and base-pair space.
//!
//! Everything in this module is pure: no state, no I/O. Navigation
//! transitions and the derived locus cache are both built on top of it.
//!
//! Resolution ladders are ordered coarsest first, so `ladder[0]` holds the
//! largest bin size (bp per bin) and the last entry the finest one.

use crate::ViewDimensions;
use serde::{Deserialize, Serialize};

/// Upper bound for pixels rendered per bin.
pub const MAX_PIXEL_SIZE: f64 = 128.0;

/// Floor used whenever the dataset cannot answer a minimum-pixel-size lookup.
pub const DEFAULT_PIXEL_SIZE: f64 = 1.0;

/// Pixel-size cap applied when jumping to a chromosome pair at its minimum
/// zoom. It differs from [`MAX_PIXEL_SIZE`] and is possibly an unintentional
/// inconsistency; kept as a separate constant so the two can be reconciled.
pub const WHOLE_GENOME_MAX_PIXEL_SIZE: f64 = 100.0;

/// Closed base-pair interval, 1-based start as shown to users.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomicRange {
    pub start_bp: u64,
    pub end_bp: u64,
}

impl GenomicRange {
    pub fn width_bp(&self) -> u64 {
        self.end_bp.saturating_sub(self.start_bp) + 1
    }
}

/// Pick the finest zoom whose bin size does not undercut the requested
/// bp-per-pixel. Index 0 is never scanned: it is what remains when nothing
/// finer qualifies.
pub fn find_matching_zoom_index(target_bp_per_pixel: f64, ladder: &[u64]) -> usize {
    (1..ladder.len())
        .rev()
        .find(|&zoom_index| ladder[zoom_index] as f64 >= target_bp_per_pixel)
        .unwrap_or(0)
}

/// Base-pair extent covered by `viewport_pixels` starting at `bin_offset`.
pub fn genomic_range_from_bin(
    bin_offset: f64,
    pixels_per_bin: f64,
    bin_size_bp: u64,
    viewport_pixels: f64,
    chromosome_length: u64,
) -> GenomicRange {
    let bin_size = bin_size_bp as f64;
    // float-to-int casts saturate, so only the additions can overflow
    let start_bp = 1u64.saturating_add((bin_offset * bin_size).round().max(0.0) as u64);
    let visible_bp = ((viewport_pixels / pixels_per_bin) * bin_size).round().max(0.0) as u64;
    let end_bp = visible_bp
        .saturating_add(start_bp - 1)
        .min(chromosome_length);
    GenomicRange { start_bp, end_bp }
}

pub fn bin_from_genomic_position(bp: f64, bin_size_bp: u64) -> f64 {
    bp / bin_size_bp as f64
}

/// Largest top-left bin offset that still keeps the viewport inside the
/// chromosome. Zero when the whole chromosome fits.
pub fn max_bin_offset(
    chromosome_length: u64,
    bin_size_bp: u64,
    viewport_pixels: f64,
    pixel_size: f64,
) -> f64 {
    let length_in_bins = chromosome_length as f64 / bin_size_bp as f64;
    let viewport_bins = viewport_pixels / pixel_size;
    (length_in_bins - viewport_bins).max(0.0)
}

/// Pixel size at which the chromosome pair exactly fills the viewport along
/// its tighter axis.
pub fn minimum_pixel_size(
    chr1_length: u64,
    chr2_length: u64,
    bin_size_bp: u64,
    viewport: ViewDimensions,
) -> f64 {
    let bins1 = chr1_length as f64 / bin_size_bp as f64;
    let bins2 = chr2_length as f64 / bin_size_bp as f64;
    (viewport.width / bins1).min(viewport.height / bins2)
}

/// Finest zoom at which the whole chromosome pair still fits the viewport.
/// Zooming out past it means leaving the pair for the genome overview.
pub fn minimum_zoom_index(
    chr1_length: u64,
    chr2_length: u64,
    viewport: ViewDimensions,
    ladder: &[u64],
) -> usize {
    let required_bp_per_pixel =
        (chr1_length as f64 / viewport.width).max(chr2_length as f64 / viewport.height);
    (1..ladder.len())
        .find(|&zoom_index| (ladder[zoom_index] as f64) < required_bp_per_pixel)
        .map(|zoom_index| zoom_index - 1)
        .unwrap_or(ladder.len().saturating_sub(1))
}

/// Which segment of a concatenation of `lengths` holds `offset_bp`.
pub fn locate_in_concatenation(lengths: &[u64], offset_bp: f64) -> Option<usize> {
    if offset_bp < 0.0 {
        return None;
    }
    let mut segment_end = 0.0;
    for (position, length) in lengths.iter().enumerate() {
        segment_end += *length as f64;
        if offset_bp < segment_end {
            return Some(position);
        }
    }
    None
}

pub fn clamp_pixel_size(pixel_size: f64) -> f64 {
    pixel_size.clamp(DEFAULT_PIXEL_SIZE, MAX_PIXEL_SIZE)
}
