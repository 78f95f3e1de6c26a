use crate::dataset_file::{DatasetDescription, load_dataset_description};
use anyhow::{Context, Result};
use frontend::{
    ContactMapViewer, ContactRecord, Dataset, DatasetError, DatasetKind, FixedViewport,
    MatrixDataset, MatrixRegion, NavigationState, RenderError, Renderer, StatePublished,
    WheelDisposition, WheelGesture,
};
use futures::channel::mpsc::UnboundedReceiver;
use futures::future::{LocalBoxFuture, join_all};
use futures::{FutureExt, StreamExt};
use serde::Serialize;
use shared::{Chromosome, SyncState, ViewDimensions, ViewerSection};
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

/// Stands in for the canvas; repaints only count.
#[derive(Default)]
struct HeadlessRenderer {
    repaints: Cell<u64>,
}

impl Renderer for HeadlessRenderer {
    fn repaint(&self) -> LocalBoxFuture<'_, Result<(), RenderError>> {
        self.repaints.set(self.repaints.get() + 1);
        log::debug!("repaint #{}", self.repaints.get());
        async { Ok(()) }.boxed_local()
    }
}

/// Yields to the executor once per pixel-size lookup, the way a matrix
/// whose header is still streaming does, so replayed wheel ticks can land
/// while a transition is in flight.
struct PacedDataset {
    inner: MatrixDataset,
}

impl Dataset for PacedDataset {
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
        async move {
            tokio::task::yield_now().await;
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

#[derive(Debug, Serialize)]
pub struct Report {
    pub bookmark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locus: Option<String>,
    pub bin_size_bp: Option<u64>,
    pub state: NavigationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncState>,
    pub renders: u64,
    pub published: usize,
}

pub struct HeadlessSession {
    viewer: Rc<ContactMapViewer>,
    published: RefCell<UnboundedReceiver<StatePublished>>,
}

impl HeadlessSession {
    pub async fn open(config: &ViewerSection, dataset_path: &Path) -> Result<Self> {
        let description = load_dataset_description(dataset_path)?;
        Self::from_description(config, description)
            .await
            .with_context(|| format!("Failed to load dataset: {}", dataset_path.display()))
    }

    pub async fn from_description(
        config: &ViewerSection,
        description: DatasetDescription,
    ) -> Result<Self> {
        let dataset = PacedDataset {
            inner: description.into_dataset(),
        };
        let viewport = Rc::new(FixedViewport::new(ViewDimensions::new(
            config.viewport_width,
            config.viewport_height,
        )));
        let (viewer, published) =
            ContactMapViewer::new(config, viewport, Rc::new(HeadlessRenderer::default()));
        viewer.load_dataset(Rc::new(dataset)).await?;
        log::info!(
            "dataset loaded with {} chromosomes",
            viewer.dataset().map_or(0, |dataset| dataset.chromosomes().len())
        );
        Ok(Self {
            viewer,
            published: RefCell::new(published),
        })
    }

    pub fn viewer(&self) -> &ContactMapViewer {
        &self.viewer
    }

    /// Deliver every tick without waiting for the previous one, as a fast
    /// wheel does. Ticks landing mid-transition are coalesced.
    pub async fn replay_wheel(
        &self,
        factors: &[f64],
        anchor_x: f64,
        anchor_y: f64,
    ) -> Result<Vec<WheelDisposition>> {
        let ticks = factors.iter().map(|&scale_factor| {
            self.viewer.wheel_zoom(WheelGesture {
                anchor_x,
                anchor_y,
                scale_factor,
            })
        });
        let mut dispositions = Vec::with_capacity(factors.len());
        for (scale_factor, disposition) in factors.iter().zip(join_all(ticks).await) {
            let disposition = disposition?;
            match &disposition {
                WheelDisposition::Coalesced => log::info!("x{scale_factor} coalesced"),
                WheelDisposition::Processed(gestures) => {
                    log::info!("x{scale_factor} processed as {} transition(s)", gestures.len())
                }
            }
            dispositions.push(disposition);
        }
        Ok(dispositions)
    }

    /// Summarise the active state and drain the publication stream.
    pub fn report(&self) -> Result<Report> {
        let state = self.viewer.state();
        let mut published = 0;
        {
            let mut stream = self.published.borrow_mut();
            while let Some(Some(_event)) = stream.next().now_or_never() {
                published += 1;
            }
        }
        let bin_size_bp = self
            .viewer
            .dataset()
            .and_then(|dataset| dataset.bin_size(state.zoom_index()));
        Ok(Report {
            bookmark: state.to_string(),
            locus: state.locus().map(ToString::to_string),
            bin_size_bp,
            sync: self.viewer.sync_state(),
            renders: self.viewer.render_stats().renders,
            published,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn session() -> HeadlessSession {
        let description = DatasetDescription::from_toml_str(
            r#"
            genome_id = "hg38"
            resolutions = [2500000, 1000000, 500000, 100000]

            [[chromosomes]]
            name = "chr1"
            length = 100000000

            [[chromosomes]]
            name = "chr2"
            length = 80000000
            "#,
        )
        .unwrap();
        HeadlessSession::from_description(&ViewerSection::default(), description)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn goto_reports_locus_and_resolution() {
        let session = session().await;

        session.viewer().goto_locus("chr1:1-50,000,000").await.unwrap();
        let report = session.report().unwrap();

        assert_eq!(report.bin_size_bp, Some(100_000));
        assert_eq!(report.locus.as_deref(), Some("chr1:0-50000000 chr1:0-50000000"));
        assert_eq!(report.bookmark, "1,1,3,0,0,1.6,NONE");
        assert_eq!(report.renders, 2);
        assert_eq!(report.published, 2);
    }

    #[tokio::test]
    async fn wheel_replay_zooms_in() {
        let session = session().await;
        session.viewer().goto_locus("chr1").await.unwrap();
        let before = session.viewer().sync_state().unwrap();

        session.replay_wheel(&[2.0, 2.0], 400.0, 400.0).await.unwrap();

        let after = session.viewer().sync_state().unwrap();
        assert_eq!(after.chr1_name, "chr1");
        assert!(after.bp_per_pixel() < before.bp_per_pixel());
    }

    #[tokio::test]
    async fn wheel_burst_is_coalesced_behind_the_first_tick() {
        let session = session().await;
        session.viewer().goto_locus("chr1").await.unwrap();

        let dispositions = session
            .replay_wheel(&[2.0, 2.0, 2.0], 400.0, 400.0)
            .await
            .unwrap();

        let WheelDisposition::Processed(gestures) = &dispositions[0] else {
            panic!("first tick should be processed, got {:?}", dispositions[0]);
        };
        assert_eq!(gestures.len(), 2);
        assert_eq!(gestures[1].scale_factor, 4.0);
        assert_eq!(
            dispositions[1..],
            [WheelDisposition::Coalesced, WheelDisposition::Coalesced]
        );
    }

    #[tokio::test]
    async fn missing_dataset_file_is_reported() {
        let result =
            HeadlessSession::open(&ViewerSection::default(), Path::new("/nonexistent.toml")).await;
        let error = result.err().unwrap();
        assert!(format!("{error:#}").contains("Failed to read dataset description"));
    }
}
