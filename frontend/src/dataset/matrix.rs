use super::{
    ContactRecord, Dataset, DatasetError, DatasetKind, MatrixRegion, metadata_min_pixel_size,
};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use shared::{Chromosome, ViewDimensions};
use std::cell::Cell;

/// Decoder for a binary contact-matrix file. Implementations live outside
/// this crate; the dataset only forwards region queries to it.
pub trait MatrixReader {
    fn read_region(
        &self,
        region: &MatrixRegion,
    ) -> LocalBoxFuture<'_, Result<Vec<ContactRecord>, String>>;
}

/// File-backed contact matrix.
///
/// Metadata may still be streaming in when the viewer starts navigating, so
/// readiness is tracked and lookups fail with [`DatasetError::NotReady`]
/// until [`MatrixDataset::mark_ready`] is called.
pub struct MatrixDataset {
    genome_id: Option<String>,
    chromosomes: Vec<Chromosome>,
    resolutions: Vec<u64>,
    ready: Cell<bool>,
    reader: Option<Box<dyn MatrixReader>>,
}

impl MatrixDataset {
    pub fn new(
        genome_id: Option<String>,
        chromosomes: Vec<Chromosome>,
        resolutions: Vec<u64>,
    ) -> Self {
        Self {
            genome_id,
            chromosomes,
            resolutions,
            ready: Cell::new(true),
            reader: None,
        }
    }

    pub fn with_reader(mut self, reader: Box<dyn MatrixReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Starts in the not-ready state.
    pub fn pending(mut self) -> Self {
        self.ready = Cell::new(false);
        self
    }

    pub fn mark_ready(&self) {
        self.ready.set(true);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }
}

impl Dataset for MatrixDataset {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Matrix
    }

    fn genome_id(&self) -> Option<&str> {
        self.genome_id.as_deref()
    }

    fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    fn resolution_ladder(&self) -> &[u64] {
        &self.resolutions
    }

    fn min_pixel_size(
        &self,
        chr1_index: usize,
        chr2_index: usize,
        zoom_index: usize,
        viewport: ViewDimensions,
    ) -> LocalBoxFuture<'_, Result<f64, DatasetError>> {
        async move {
            if !self.is_ready() {
                return Err(DatasetError::NotReady);
            }
            metadata_min_pixel_size(self, chr1_index, chr2_index, zoom_index, viewport)
        }
        .boxed_local()
    }

    fn contact_records_for(
        &self,
        region: MatrixRegion,
    ) -> LocalBoxFuture<'_, Result<Vec<ContactRecord>, DatasetError>> {
        async move {
            if !self.is_ready() {
                return Err(DatasetError::NotReady);
            }
            if self.bin_size(region.zoom_index).is_none() {
                return Err(DatasetError::UnknownZoom(region.zoom_index));
            }
            let Some(reader) = &self.reader else {
                // Metadata-only dataset
                return Ok(Vec::new());
            };
            reader
                .read_region(&region)
                .await
                .map_err(DatasetError::Reader)
        }
        .boxed_local()
    }
}
