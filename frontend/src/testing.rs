//! Test fixtures: a small genome, a dataset whose next lookup can be held
//! open, and renderers that count or hold repaints.

use crate::dataset::{
    ContactRecord, Dataset, DatasetError, DatasetKind, LiveDataset, MatrixRegion,
    build_chromosomes,
};
use crate::visualizer::canvas::{RenderError, Renderer};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use shared::{Chromosome, ViewDimensions};
use std::cell::{Cell, RefCell};

pub const FIXTURE_LADDER: [u64; 4] = [2_500_000, 1_000_000, 500_000, 100_000];

/// `All` plus three chromosomes of 100, 80 and 60 Mb.
pub fn fixture_dataset() -> LiveDataset {
    fixture_dataset_for(Some("hg38"))
}

pub fn fixture_dataset_for(genome_id: Option<&str>) -> LiveDataset {
    LiveDataset::new(
        genome_id.map(str::to_string),
        build_chromosomes(
            [("chr1", 100_000_000), ("chr2", 80_000_000), ("chr3", 60_000_000)],
            true,
        ),
        FIXTURE_LADDER.to_vec(),
    )
}

/// Releases whatever waits on the paired receiver.
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

fn gate() -> (Gate, oneshot::Receiver<()>) {
    let (sender, receiver) = oneshot::channel();
    (Gate(sender), receiver)
}

/// Wraps a dataset so the next min-pixel-size lookup after [`arm`] blocks
/// until the returned gate opens.
///
/// [`arm`]: GatedDataset::arm
pub struct GatedDataset {
    inner: LiveDataset,
    gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl GatedDataset {
    pub fn new(inner: LiveDataset) -> Self {
        Self {
            inner,
            gate: RefCell::new(None),
        }
    }

    pub fn arm(&self) -> Gate {
        let (gate, receiver) = gate();
        *self.gate.borrow_mut() = Some(receiver);
        gate
    }
}

impl Dataset for GatedDataset {
    fn kind(&self) -> DatasetKind {
        self.inner.kind()
    }

    fn genome_id(&self) -> Option<&str> {
        self.inner.genome_id()
    }

    fn chromosomes(&self) -> &[Chromosome] {
        self.inner.chromosomes()
    }

    fn resolution_ladder(&self) -> &[u64] {
        self.inner.resolution_ladder()
    }

    fn min_pixel_size(
        &self,
        chr1_index: usize,
        chr2_index: usize,
        zoom_index: usize,
        viewport: ViewDimensions,
    ) -> LocalBoxFuture<'_, Result<f64, DatasetError>> {
        let gate = self.gate.borrow_mut().take();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.inner
                .min_pixel_size(chr1_index, chr2_index, zoom_index, viewport)
                .await
        }
        .boxed_local()
    }

    fn contact_records_for(
        &self,
        region: MatrixRegion,
    ) -> LocalBoxFuture<'_, Result<Vec<ContactRecord>, DatasetError>> {
        self.inner.contact_records_for(region)
    }
}

#[derive(Default)]
pub struct CountingRenderer {
    repaints: Cell<usize>,
}

impl CountingRenderer {
    pub fn repaints(&self) -> usize {
        self.repaints.get()
    }
}

impl Renderer for CountingRenderer {
    fn repaint(&self) -> LocalBoxFuture<'_, Result<(), RenderError>> {
        self.repaints.set(self.repaints.get() + 1);
        async { Ok(()) }.boxed_local()
    }
}

/// Holds its first repaint open until the gate opens; later repaints
/// complete immediately.
pub struct GatedRenderer {
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    repaints: Cell<usize>,
    fail_first: bool,
}

impl GatedRenderer {
    pub fn new() -> (Self, Gate) {
        Self::build(false)
    }

    /// Like [`GatedRenderer::new`], but the held repaint fails.
    pub fn failing_first() -> (Self, Gate) {
        Self::build(true)
    }

    fn build(fail_first: bool) -> (Self, Gate) {
        let (gate, receiver) = gate();
        let renderer = Self {
            gate: RefCell::new(Some(receiver)),
            repaints: Cell::new(0),
            fail_first,
        };
        (renderer, gate)
    }

    pub fn repaints(&self) -> usize {
        self.repaints.get()
    }
}

impl Renderer for GatedRenderer {
    fn repaint(&self) -> LocalBoxFuture<'_, Result<(), RenderError>> {
        let call = self.repaints.get();
        self.repaints.set(call + 1);
        let gate = self.gate.borrow_mut().take();
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_first && call == 0 {
                Err(RenderError::Failed("context lost".into()))
            } else {
                Ok(())
            }
        }
        .boxed_local()
    }
}
