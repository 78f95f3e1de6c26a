//! State transitions for pan, zoom, goto and peer sync.
//!
//! Every transition mutates the state it is called on; callers clone the
//! active state first and hand the result to the state manager.

use super::NavigationState;
use crate::dataset::Dataset;
use shared::coordinates::{
    self, clamp_pixel_size, find_matching_zoom_index, genomic_range_from_bin, max_bin_offset,
};
use shared::{
    AxisLocus, Chromosome, DEFAULT_PIXEL_SIZE, Locus, SyncState, ViewDimensions,
    WHOLE_GENOME_MAX_PIXEL_SIZE,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("unknown chromosome `{0}`")]
    UnknownChromosomeName(String),
    #[error("chromosome index {0} is out of range")]
    ChromosomeOutOfRange(usize),
    #[error("zoom index {0} is out of range")]
    ZoomOutOfRange(usize),
    #[error("range {start_bp}-{end_bp} on {chr} is empty or outside the chromosome")]
    EmptyRange {
        chr: String,
        start_bp: u64,
        end_bp: u64,
    },
}

/// What a transition changed compared to the state it started from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub chr_changed: bool,
    pub resolution_changed: bool,
}

impl TransitionOutcome {
    pub fn between(previous: &NavigationState, next: &NavigationState) -> Self {
        Self {
            chr_changed: previous.chr1_index != next.chr1_index
                || previous.chr2_index != next.chr2_index,
            resolution_changed: previous.zoom_index != next.zoom_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    fn pixel_factor(self) -> f64 {
        match self {
            ZoomDirection::In => 2.0,
            ZoomDirection::Out => 0.5,
        }
    }
}

/// One axis of a goto request, 0-based start and exclusive end in bp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub chr_index: usize,
    pub start_bp: u64,
    pub end_bp: u64,
}

impl AxisRange {
    /// Cut the end back to the chromosome length. Ranges left with no
    /// width are rejected.
    fn clipped_to(self, chromosome: &Chromosome) -> Result<AxisRange, TransitionError> {
        let end_bp = self.end_bp.min(chromosome.length_bp);
        if self.start_bp >= end_bp {
            return Err(TransitionError::EmptyRange {
                chr: chromosome.name.clone(),
                start_bp: self.start_bp,
                end_bp: self.end_bp,
            });
        }
        Ok(AxisRange { end_bp, ..self })
    }
}

/// Dataset and viewport a transition is evaluated against.
#[derive(Clone, Copy)]
pub struct NavigationContext<'a> {
    pub dataset: &'a dyn Dataset,
    pub viewport: ViewDimensions,
}

impl<'a> NavigationContext<'a> {
    pub fn new(dataset: &'a dyn Dataset, viewport: ViewDimensions) -> Self {
        Self { dataset, viewport }
    }

    pub fn chromosome(&self, index: usize) -> Result<&'a Chromosome, TransitionError> {
        self.dataset
            .chromosome(index)
            .ok_or(TransitionError::ChromosomeOutOfRange(index))
    }

    pub fn chromosome_index(&self, name: &str) -> Result<usize, TransitionError> {
        self.dataset
            .chromosome_index(name)
            .ok_or_else(|| TransitionError::UnknownChromosomeName(name.to_string()))
    }

    pub fn bin_size(&self, zoom_index: usize) -> Result<u64, TransitionError> {
        self.dataset
            .bin_size(zoom_index)
            .ok_or(TransitionError::ZoomOutOfRange(zoom_index))
    }

    pub fn ladder(&self) -> &'a [u64] {
        self.dataset.resolution_ladder()
    }

    pub fn finest_zoom(&self) -> usize {
        self.ladder().len().saturating_sub(1)
    }

    /// Minimum pixel size for the pair, or [`DEFAULT_PIXEL_SIZE`] when the
    /// dataset cannot answer yet.
    pub async fn min_pixel_size(&self, chr1_index: usize, chr2_index: usize, zoom_index: usize) -> f64 {
        match self
            .dataset
            .min_pixel_size(chr1_index, chr2_index, zoom_index, self.viewport)
            .await
        {
            Ok(pixel_size) => pixel_size,
            Err(error) => {
                log::warn!(
                    "min pixel size lookup for {chr1_index}/{chr2_index} at zoom {zoom_index} failed: {error}"
                );
                DEFAULT_PIXEL_SIZE
            }
        }
    }

    /// Finest zoom at which the chromosome pair is still fully visible.
    pub fn minimum_zoom_index(&self, chr1_index: usize, chr2_index: usize) -> Result<usize, TransitionError> {
        let chr1 = self.chromosome(chr1_index)?;
        let chr2 = self.chromosome(chr2_index)?;
        Ok(coordinates::minimum_zoom_index(
            chr1.length_bp,
            chr2.length_bp,
            self.viewport,
            self.ladder(),
        ))
    }
}

/// Raise to the dataset floor, then bound to the global pixel-size range.
pub fn floor_pixel_size(pixel_size: f64, min_pixel_size: f64) -> f64 {
    clamp_pixel_size(pixel_size.max(min_pixel_size))
}

impl NavigationState {
    /// Keep the viewport inside the chromosome pair. Idempotent.
    pub fn clamp_xy(&mut self, ctx: &NavigationContext<'_>) -> Result<(), TransitionError> {
        let bin_size = ctx.bin_size(self.zoom_index)?;
        let chr1 = ctx.chromosome(self.chr1_index)?;
        let chr2 = ctx.chromosome(self.chr2_index)?;
        let max_x = max_bin_offset(chr1.length_bp, bin_size, ctx.viewport.width, self.pixel_size);
        let max_y = max_bin_offset(chr2.length_bp, bin_size, ctx.viewport.height, self.pixel_size);
        self.bin_x = self.bin_x.clamp(0.0, max_x);
        self.bin_y = self.bin_y.clamp(0.0, max_y);
        Ok(())
    }

    /// Recompute the derived locus from the primary fields.
    pub fn configure_locus(&mut self, ctx: &NavigationContext<'_>) -> Result<(), TransitionError> {
        let bin_size = ctx.bin_size(self.zoom_index)?;
        let chr1 = ctx.chromosome(self.chr1_index)?;
        let chr2 = ctx.chromosome(self.chr2_index)?;
        let x = genomic_range_from_bin(
            self.bin_x,
            self.pixel_size,
            bin_size,
            ctx.viewport.width,
            chr1.length_bp,
        );
        let y = genomic_range_from_bin(
            self.bin_y,
            self.pixel_size,
            bin_size,
            ctx.viewport.height,
            chr2.length_bp,
        );
        self.locus = Some(Locus {
            x: AxisLocus {
                chr: chr1.name.clone(),
                start: x.start_bp,
                end: x.end_bp,
            },
            y: AxisLocus {
                chr: chr2.name.clone(),
                start: y.start_bp,
                end: y.end_bp,
            },
        });
        Ok(())
    }

    /// Drag pan by a pixel delta.
    pub fn pan_shift(
        &mut self,
        dx: f64,
        dy: f64,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        self.bin_x += dx / self.pixel_size;
        self.bin_y += dy / self.pixel_size;
        self.clamp_xy(ctx)?;
        self.configure_locus(ctx)?;
        Ok(TransitionOutcome::default())
    }

    /// Change zoom and pixel size while the genomic position under the
    /// anchor pixel stays put. The locus is left for the caller to refresh.
    pub fn pan_with_zoom(
        &mut self,
        new_zoom_index: usize,
        new_pixel_size: f64,
        anchor_x: f64,
        anchor_y: f64,
        new_bin_size: u64,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let old_bin_size = ctx.bin_size(self.zoom_index)? as f64;
        let new_bin_size = new_bin_size as f64;

        let anchor_bp_x = (self.bin_x + anchor_x / self.pixel_size) * old_bin_size;
        let anchor_bp_y = (self.bin_y + anchor_y / self.pixel_size) * old_bin_size;

        let resolution_changed = new_zoom_index != self.zoom_index;
        self.zoom_index = new_zoom_index;
        self.pixel_size = new_pixel_size;
        self.bin_x = anchor_bp_x / new_bin_size - anchor_x / new_pixel_size;
        self.bin_y = anchor_bp_y / new_bin_size - anchor_y / new_pixel_size;
        self.clamp_xy(ctx)?;

        Ok(TransitionOutcome {
            chr_changed: false,
            resolution_changed,
        })
    }

    /// Switch resolution keeping the viewport center fixed.
    pub async fn set_with_zoom(
        &mut self,
        zoom_index: usize,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let old_bin_size = ctx.bin_size(self.zoom_index)? as f64;
        let new_bin_size = ctx.bin_size(zoom_index)? as f64;
        let scale = old_bin_size / new_bin_size;

        let center_x = self.bin_x + ctx.viewport.width / (2.0 * self.pixel_size);
        let center_y = self.bin_y + ctx.viewport.height / (2.0 * self.pixel_size);

        let min_pixel_size = ctx
            .min_pixel_size(self.chr1_index, self.chr2_index, zoom_index)
            .await;
        let resolution_changed = zoom_index != self.zoom_index;
        self.zoom_index = zoom_index;
        self.pixel_size = floor_pixel_size(DEFAULT_PIXEL_SIZE, min_pixel_size);
        self.bin_x = (center_x * scale - ctx.viewport.width / (2.0 * self.pixel_size)).max(0.0);
        self.bin_y = (center_y * scale - ctx.viewport.height / (2.0 * self.pixel_size)).max(0.0);
        self.clamp_xy(ctx)?;
        self.configure_locus(ctx)?;

        Ok(TransitionOutcome {
            chr_changed: false,
            resolution_changed,
        })
    }

    /// Goto a base-pair rectangle. The requested ranges become the locus
    /// verbatim instead of being derived from the new offsets.
    pub async fn update_with_loci(
        &mut self,
        x: AxisRange,
        y: AxisRange,
        resolution_locked: bool,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let chr1 = ctx.chromosome(x.chr_index)?;
        let chr2 = ctx.chromosome(y.chr_index)?;
        let x = x.clipped_to(chr1)?;
        let y = y.clipped_to(chr2)?;

        let bp_per_pixel_x = x.end_bp.saturating_sub(x.start_bp) as f64 / ctx.viewport.width;
        let bp_per_pixel_y = y.end_bp.saturating_sub(y.start_bp) as f64 / ctx.viewport.height;
        let target_bp_per_pixel = bp_per_pixel_x.max(bp_per_pixel_y);

        let zoom_index = if resolution_locked {
            self.zoom_index
        } else {
            find_matching_zoom_index(target_bp_per_pixel, ctx.ladder())
        };
        let bin_size = ctx.bin_size(zoom_index)?;
        let min_pixel_size = ctx
            .min_pixel_size(x.chr_index, y.chr_index, zoom_index)
            .await;

        let previous = self.clone();
        self.chr1_index = x.chr_index;
        self.chr2_index = y.chr_index;
        self.zoom_index = zoom_index;
        self.pixel_size = floor_pixel_size(bin_size as f64 / target_bp_per_pixel, min_pixel_size);
        self.bin_x = coordinates::bin_from_genomic_position(x.start_bp as f64, bin_size);
        self.bin_y = coordinates::bin_from_genomic_position(y.start_bp as f64, bin_size);
        self.locus = Some(Locus {
            x: AxisLocus {
                chr: chr1.name.clone(),
                start: x.start_bp,
                end: x.end_bp,
            },
            y: AxisLocus {
                chr: chr2.name.clone(),
                start: y.start_bp,
                end: y.end_bp,
            },
        });
        self.transpose_if_needed();

        Ok(TransitionOutcome::between(&previous, self))
    }

    /// Adopt a peer's view. The caller has already checked compatibility.
    pub fn sync(
        &mut self,
        peer: &SyncState,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let chr1_index = ctx.chromosome_index(&peer.chr1_name)?;
        let chr2_index = ctx.chromosome_index(&peer.chr2_name)?;

        let target_bp_per_pixel = peer.bp_per_pixel();
        let zoom_index = find_matching_zoom_index(target_bp_per_pixel, ctx.ladder());
        let bin_size = ctx.bin_size(zoom_index)? as f64;
        let scale = peer.bin_size_bp as f64 / bin_size;

        let previous = self.clone();
        self.chr1_index = chr1_index;
        self.chr2_index = chr2_index;
        self.zoom_index = zoom_index;
        self.pixel_size = clamp_pixel_size(bin_size / target_bp_per_pixel);
        self.bin_x = peer.bin_x * scale;
        self.bin_y = peer.bin_y * scale;
        self.transpose_if_needed();
        self.clamp_xy(ctx)?;
        self.configure_locus(ctx)?;

        Ok(TransitionOutcome::between(&previous, self))
    }

    /// Show a chromosome pair whole, at its minimum zoom.
    pub async fn set_chromosomes(
        &mut self,
        chr1_index: usize,
        chr2_index: usize,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        let (chr1_index, chr2_index) = (chr1_index.min(chr2_index), chr1_index.max(chr2_index));
        let chr1 = ctx.chromosome(chr1_index)?;
        let zoom_index = if chr1.is_whole_genome() {
            0
        } else {
            ctx.minimum_zoom_index(chr1_index, chr2_index)?
        };
        ctx.bin_size(zoom_index)?;
        let min_pixel_size = ctx.min_pixel_size(chr1_index, chr2_index, zoom_index).await;

        let previous = self.clone();
        self.chr1_index = chr1_index;
        self.chr2_index = chr2_index;
        self.zoom_index = zoom_index;
        self.bin_x = 0.0;
        self.bin_y = 0.0;
        self.pixel_size = WHOLE_GENOME_MAX_PIXEL_SIZE.min(DEFAULT_PIXEL_SIZE.max(min_pixel_size));
        self.configure_locus(ctx)?;

        Ok(TransitionOutcome::between(&previous, self))
    }

    /// Double or halve the pixel size at the current resolution, keeping
    /// the viewport centered.
    pub async fn zoom_pixels(
        &mut self,
        direction: ZoomDirection,
        ctx: &NavigationContext<'_>,
    ) -> Result<TransitionOutcome, TransitionError> {
        ctx.bin_size(self.zoom_index)?;
        let min_pixel_size = ctx
            .min_pixel_size(self.chr1_index, self.chr2_index, self.zoom_index)
            .await;
        let old_pixel_size = self.pixel_size;
        let new_pixel_size = floor_pixel_size(old_pixel_size * direction.pixel_factor(), min_pixel_size);

        let shift = 1.0 / old_pixel_size - 1.0 / new_pixel_size;
        self.bin_x += ctx.viewport.width / 2.0 * shift;
        self.bin_y += ctx.viewport.height / 2.0 * shift;
        self.pixel_size = new_pixel_size;
        self.clamp_xy(ctx)?;
        self.configure_locus(ctx)?;

        Ok(TransitionOutcome::default())
    }
}
