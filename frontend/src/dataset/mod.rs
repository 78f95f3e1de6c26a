//! Dataset capability contract consumed by the navigation engine
//!
//! The engine never decodes matrix files itself. It only asks a dataset for
//! chromosome metadata, the resolution ladder, the minimum pixel size of a
//! chromosome pair, and contact records for a region. Two variants exist:
//! [`MatrixDataset`] (file-backed, records from a pluggable reader) and
//! [`LiveDataset`] (filled programmatically at runtime).

mod live;
mod matrix;

pub use live::LiveDataset;
pub use matrix::{MatrixDataset, MatrixReader};

use futures::future::LocalBoxFuture;
use shared::{Chromosome, Normalization, SyncState, ViewDimensions, coordinates, find_chromosome};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset metadata is not loaded yet")]
    NotReady,
    #[error("chromosome index {0} is out of range")]
    UnknownChromosome(usize),
    #[error("zoom index {0} is out of range")]
    UnknownZoom(usize),
    #[error("matrix reader failed: {0}")]
    Reader(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Matrix,
    Live,
}

/// One non-zero cell of the contact matrix, in bins at the request's zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    pub bin_x: u64,
    pub bin_y: u64,
    pub counts: f32,
}

/// Half-open bin rectangle of one chromosome-pair matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRegion {
    pub chr1_index: usize,
    pub chr2_index: usize,
    pub zoom_index: usize,
    pub bin_x_start: u64,
    pub bin_x_end: u64,
    pub bin_y_start: u64,
    pub bin_y_end: u64,
    pub normalization: Normalization,
}

impl MatrixRegion {
    pub fn contains(&self, record: &ContactRecord) -> bool {
        (self.bin_x_start..self.bin_x_end).contains(&record.bin_x)
            && (self.bin_y_start..self.bin_y_end).contains(&record.bin_y)
    }
}

pub trait Dataset {
    fn kind(&self) -> DatasetKind;

    fn genome_id(&self) -> Option<&str>;

    fn chromosomes(&self) -> &[Chromosome];

    /// Bin sizes in bp, coarsest first.
    fn resolution_ladder(&self) -> &[u64];

    /// Smallest pixel size at which the chromosome pair still fills the
    /// viewport at `zoom_index`.
    fn min_pixel_size(
        &self,
        chr1_index: usize,
        chr2_index: usize,
        zoom_index: usize,
        viewport: ViewDimensions,
    ) -> LocalBoxFuture<'_, Result<f64, DatasetError>>;

    fn contact_records_for(
        &self,
        region: MatrixRegion,
    ) -> LocalBoxFuture<'_, Result<Vec<ContactRecord>, DatasetError>>;

    fn chromosome(&self, index: usize) -> Option<&Chromosome> {
        self.chromosomes().get(index)
    }

    fn chromosome_index(&self, name: &str) -> Option<usize> {
        find_chromosome(self.chromosomes(), name).map(|chromosome| chromosome.index)
    }

    fn bin_size(&self, zoom_index: usize) -> Option<u64> {
        self.resolution_ladder().get(zoom_index).copied()
    }

    fn is_whole_genome(&self, chr_index: usize) -> bool {
        self.chromosome(chr_index)
            .is_some_and(Chromosome::is_whole_genome)
    }

    /// Whether a peer's state can be mapped onto this dataset. Genome ids
    /// must agree when both sides carry one; both chromosomes must exist.
    fn is_compatible(&self, peer: &SyncState) -> bool {
        let same_genome = match (self.genome_id(), peer.genome_id.as_deref()) {
            (Some(local), Some(remote)) => local.eq_ignore_ascii_case(remote),
            _ => true,
        };
        same_genome
            && self.chromosome_index(&peer.chr1_name).is_some()
            && self.chromosome_index(&peer.chr2_name).is_some()
    }
}

/// Minimum pixel size derived from chromosome metadata alone.
pub(crate) fn metadata_min_pixel_size(
    dataset: &dyn Dataset,
    chr1_index: usize,
    chr2_index: usize,
    zoom_index: usize,
    viewport: ViewDimensions,
) -> Result<f64, DatasetError> {
    let chr1 = dataset
        .chromosome(chr1_index)
        .ok_or(DatasetError::UnknownChromosome(chr1_index))?;
    let chr2 = dataset
        .chromosome(chr2_index)
        .ok_or(DatasetError::UnknownChromosome(chr2_index))?;
    let bin_size = dataset
        .bin_size(zoom_index)
        .ok_or(DatasetError::UnknownZoom(zoom_index))?;
    Ok(coordinates::minimum_pixel_size(
        chr1.length_bp,
        chr2.length_bp,
        bin_size,
        viewport,
    ))
}

/// Index chromosomes by position, prepending the whole-genome pseudo
/// chromosome when `with_whole_genome` is set.
pub fn build_chromosomes<'a>(
    entries: impl IntoIterator<Item = (&'a str, u64)>,
    with_whole_genome: bool,
) -> Vec<Chromosome> {
    let entries: Vec<(&str, u64)> = entries.into_iter().collect();
    let genome_length: u64 = entries.iter().map(|(_, length)| length).sum();
    let whole_genome = with_whole_genome.then_some((shared::WHOLE_GENOME_NAME, genome_length));
    whole_genome
        .into_iter()
        .chain(entries)
        .enumerate()
        .map(|(index, (name, length_bp))| Chromosome {
            index,
            name: name.to_string(),
            length_bp,
        })
        .collect()
}
