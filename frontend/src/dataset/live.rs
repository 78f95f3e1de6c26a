use super::{
    ContactRecord, Dataset, DatasetError, DatasetKind, MatrixRegion, metadata_min_pixel_size,
};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use shared::{Chromosome, ViewDimensions};
use std::cell::RefCell;
use std::collections::HashMap;

type MatrixKey = (usize, usize, usize);

/// Contact map filled programmatically while the viewer runs.
///
/// Records are stored in upper-triangle orientation (`chr1 <= chr2`);
/// records added for a transposed pair are swapped on insertion.
pub struct LiveDataset {
    genome_id: Option<String>,
    chromosomes: Vec<Chromosome>,
    resolutions: Vec<u64>,
    records: RefCell<HashMap<MatrixKey, Vec<ContactRecord>>>,
}

impl LiveDataset {
    pub fn new(
        genome_id: Option<String>,
        chromosomes: Vec<Chromosome>,
        resolutions: Vec<u64>,
    ) -> Self {
        Self {
            genome_id,
            chromosomes,
            resolutions,
            records: RefCell::new(HashMap::new()),
        }
    }

    pub fn add_records(
        &self,
        chr1_index: usize,
        chr2_index: usize,
        zoom_index: usize,
        records: impl IntoIterator<Item = ContactRecord>,
    ) -> Result<(), DatasetError> {
        for index in [chr1_index, chr2_index] {
            if self.chromosome(index).is_none() {
                return Err(DatasetError::UnknownChromosome(index));
            }
        }
        if self.bin_size(zoom_index).is_none() {
            return Err(DatasetError::UnknownZoom(zoom_index));
        }

        let transposed = chr1_index > chr2_index;
        let key = if transposed {
            (chr2_index, chr1_index, zoom_index)
        } else {
            (chr1_index, chr2_index, zoom_index)
        };
        let records = records.into_iter().map(|record| {
            if transposed {
                ContactRecord {
                    bin_x: record.bin_y,
                    bin_y: record.bin_x,
                    counts: record.counts,
                }
            } else {
                record
            }
        });
        self.records.borrow_mut().entry(key).or_default().extend(records);
        Ok(())
    }

    pub fn record_count(&self) -> usize {
        self.records.borrow().values().map(Vec::len).sum()
    }
}

impl Dataset for LiveDataset {
    fn kind(&self) -> DatasetKind {
        DatasetKind::Live
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
        let result = metadata_min_pixel_size(self, chr1_index, chr2_index, zoom_index, viewport);
        async move { result }.boxed_local()
    }

    fn contact_records_for(
        &self,
        region: MatrixRegion,
    ) -> LocalBoxFuture<'_, Result<Vec<ContactRecord>, DatasetError>> {
        let key = (region.chr1_index, region.chr2_index, region.zoom_index);
        let records: Vec<ContactRecord> = self
            .records
            .borrow()
            .get(&key)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| region.contains(record))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        async move { Ok(records) }.boxed_local()
    }
}
