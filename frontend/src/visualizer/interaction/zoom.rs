//! Zoom computation shared by wheel, pinch and double-click gestures.

use crate::visualizer::state::{
    NavigationContext, NavigationState, TransitionError, TransitionOutcome, ZoomDirection,
    floor_pixel_size,
};
use shared::coordinates::{find_matching_zoom_index, locate_in_concatenation};

/// Continuous zoom by `factor` (> 1 zooms in) around an anchor pixel.
///
/// Picks the resolution that best matches the requested bp-per-pixel and
/// keeps the anchor's genomic position fixed. Zooming out below the pair's
/// minimum zoom leaves for the genome overview.
pub async fn pinch_zoom(
    state: &mut NavigationState,
    ctx: &NavigationContext<'_>,
    resolution_locked: bool,
    anchor_x: f64,
    anchor_y: f64,
    factor: f64,
) -> Result<TransitionOutcome, TransitionError> {
    if ctx.dataset.is_whole_genome(state.chr1_index) {
        return if factor > 1.0 {
            zoom_and_center(state, ctx, resolution_locked, ZoomDirection::In, anchor_x, anchor_y).await
        } else {
            Ok(TransitionOutcome::default())
        };
    }

    let previous = state.clone();
    let zoom_index = state.zoom_index;
    let bin_size = ctx.bin_size(zoom_index)?;
    let fixed_resolution = resolution_locked
        || (zoom_index == ctx.finest_zoom() && factor > 1.0)
        || (zoom_index == 0 && factor < 1.0);

    if fixed_resolution {
        let min_pixel_size = ctx
            .min_pixel_size(state.chr1_index, state.chr2_index, zoom_index)
            .await;
        let pixel_size = floor_pixel_size(state.pixel_size * factor, min_pixel_size);
        state.pan_with_zoom(zoom_index, pixel_size, anchor_x, anchor_y, bin_size, ctx)?;
    } else {
        let target_bp_per_pixel = bin_size as f64 / state.pixel_size / factor;
        let new_zoom = find_matching_zoom_index(target_bp_per_pixel, ctx.ladder());
        let minimum_zoom = ctx.minimum_zoom_index(state.chr1_index, state.chr2_index)?;
        if factor < 1.0 && new_zoom < minimum_zoom {
            return leave_chromosome_pair(state, ctx, minimum_zoom).await;
        }
        let new_bin_size = ctx.bin_size(new_zoom)?;
        let min_pixel_size = ctx
            .min_pixel_size(state.chr1_index, state.chr2_index, new_zoom)
            .await;
        let pixel_size = floor_pixel_size(new_bin_size as f64 / target_bp_per_pixel, min_pixel_size);
        state.pan_with_zoom(new_zoom, pixel_size, anchor_x, anchor_y, new_bin_size, ctx)?;
    }

    state.configure_locus(ctx)?;
    Ok(TransitionOutcome::between(&previous, state))
}

/// Discrete one-step zoom that recenters on the anchor.
///
/// On the genome overview a zoom-in opens the chromosome pair under the
/// anchor instead. Zooming out from the pair's minimum zoom returns to the
/// overview when the dataset has one.
pub async fn zoom_and_center(
    state: &mut NavigationState,
    ctx: &NavigationContext<'_>,
    resolution_locked: bool,
    direction: ZoomDirection,
    anchor_x: f64,
    anchor_y: f64,
) -> Result<TransitionOutcome, TransitionError> {
    if ctx.dataset.is_whole_genome(state.chr1_index) {
        if direction == ZoomDirection::Out {
            return Ok(TransitionOutcome::default());
        }
        return match chromosome_pair_at(state, ctx, anchor_x, anchor_y)? {
            Some((chr1_index, chr2_index)) => state.set_chromosomes(chr1_index, chr2_index, ctx).await,
            None => Ok(TransitionOutcome::default()),
        };
    }

    let zoom_index = state.zoom_index;
    let minimum_zoom = ctx.minimum_zoom_index(state.chr1_index, state.chr2_index)?;
    if direction == ZoomDirection::Out
        && !resolution_locked
        && zoom_index <= minimum_zoom
        && ctx.dataset.is_whole_genome(0)
    {
        return leave_chromosome_pair(state, ctx, minimum_zoom).await;
    }

    let previous = state.clone();
    state.pan_shift(
        anchor_x - ctx.viewport.width / 2.0,
        anchor_y - ctx.viewport.height / 2.0,
        ctx,
    )?;

    let fixed_resolution = resolution_locked
        || (direction == ZoomDirection::In && zoom_index == ctx.finest_zoom())
        || (direction == ZoomDirection::Out && zoom_index <= minimum_zoom);

    if fixed_resolution {
        state.zoom_pixels(direction, ctx).await?;
    } else {
        let next_zoom = match direction {
            ZoomDirection::In => zoom_index + 1,
            ZoomDirection::Out => zoom_index - 1,
        };
        state.set_with_zoom(next_zoom, ctx).await?;
    }
    Ok(TransitionOutcome::between(&previous, state))
}

async fn leave_chromosome_pair(
    state: &mut NavigationState,
    ctx: &NavigationContext<'_>,
    minimum_zoom: usize,
) -> Result<TransitionOutcome, TransitionError> {
    if ctx.dataset.is_whole_genome(0) {
        log::debug!("zoomed out past chromosome pair, showing whole genome");
        state.set_chromosomes(0, 0, ctx).await
    } else {
        state.set_with_zoom(minimum_zoom, ctx).await
    }
}

/// Chromosome pair under an anchor pixel of the genome overview.
fn chromosome_pair_at(
    state: &NavigationState,
    ctx: &NavigationContext<'_>,
    anchor_x: f64,
    anchor_y: f64,
) -> Result<Option<(usize, usize)>, TransitionError> {
    let bin_size = ctx.bin_size(state.zoom_index)? as f64;
    let genome_x = (state.bin_x + anchor_x / state.pixel_size) * bin_size;
    let genome_y = (state.bin_y + anchor_y / state.pixel_size) * bin_size;

    let chromosomes: Vec<_> = ctx
        .dataset
        .chromosomes()
        .iter()
        .filter(|chromosome| !chromosome.is_whole_genome())
        .collect();
    let lengths: Vec<u64> = chromosomes.iter().map(|chromosome| chromosome.length_bp).collect();

    let pair = locate_in_concatenation(&lengths, genome_x)
        .zip(locate_in_concatenation(&lengths, genome_y))
        .map(|(x, y)| (chromosomes[x].index, chromosomes[y].index));
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{LiveDataset, build_chromosomes};
    use shared::{Normalization, ViewDimensions};

    const LADDER: [u64; 4] = [2_500_000, 1_000_000, 500_000, 100_000];

    fn dataset(with_whole_genome: bool) -> LiveDataset {
        LiveDataset::new(
            None,
            build_chromosomes(
                [("chr1", 100_000_000), ("chr2", 80_000_000), ("chr3", 60_000_000)],
                with_whole_genome,
            ),
            LADDER.to_vec(),
        )
    }

    fn viewport() -> ViewDimensions {
        ViewDimensions::new(800.0, 800.0)
    }

    fn state(chr: usize, zoom: usize, x: f64, pixel_size: f64) -> NavigationState {
        NavigationState::new(chr, chr, zoom, x, x, pixel_size, Normalization::default())
    }

    #[tokio::test]
    async fn pinch_in_moves_to_finer_resolution() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 2, 10.0, 2.0);

        let outcome = pinch_zoom(&mut state, &ctx, false, 100.0, 100.0, 5.0).await.unwrap();

        // 500 kb / 2 px / 5 = 50 kb per pixel, served by 100 kb bins at 2 px
        assert_eq!(state.zoom_index(), 3);
        assert_eq!(state.pixel_size(), 2.0);
        assert_eq!(state.bin_x(), 250.0);
        assert!(outcome.resolution_changed);
        assert!(state.locus().is_some());
    }

    #[tokio::test]
    async fn small_pinch_stays_on_resolution() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 2, 10.0, 2.0);

        let outcome = pinch_zoom(&mut state, &ctx, false, 0.0, 0.0, 2.0).await.unwrap();

        // 125 kb per pixel is still best served by 500 kb bins
        assert_eq!(state.zoom_index(), 2);
        assert_eq!(state.pixel_size(), 4.0);
        assert!(!outcome.resolution_changed);
    }

    #[tokio::test]
    async fn locked_pinch_scales_pixels_only() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 3, 10.0, 2.0);

        pinch_zoom(&mut state, &ctx, true, 0.0, 0.0, 1.5).await.unwrap();

        assert_eq!(state.zoom_index(), 3);
        assert_eq!(state.pixel_size(), 3.0);
        // anchored at the origin the offset does not move
        assert_eq!(state.bin_x(), 10.0);
    }

    #[tokio::test]
    async fn finest_zoom_in_scales_pixels() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 3, 100.0, 4.0);

        pinch_zoom(&mut state, &ctx, false, 0.0, 0.0, 2.0).await.unwrap();

        assert_eq!(state.zoom_index(), 3);
        assert_eq!(state.pixel_size(), 8.0);
    }

    #[tokio::test]
    async fn zoom_out_past_minimum_shows_whole_genome() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        // chr1 fits 800 px from 500 kb bins onward
        let mut state = state(1, 2, 0.0, 1.6);

        let outcome = pinch_zoom(&mut state, &ctx, false, 400.0, 400.0, 0.25).await.unwrap();

        assert_eq!((state.chr1_index(), state.chr2_index()), (0, 0));
        assert_eq!(state.zoom_index(), 0);
        assert!(outcome.chr_changed);
    }

    #[tokio::test]
    async fn zoom_out_past_minimum_without_overview_stops_at_minimum() {
        let dataset = dataset(false);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(0, 2, 0.0, 1.6);

        pinch_zoom(&mut state, &ctx, false, 400.0, 400.0, 0.25).await.unwrap();

        assert_eq!(state.chr1_index(), 0);
        assert_eq!(state.zoom_index(), 2);
    }

    #[tokio::test]
    async fn whole_genome_zoom_in_opens_pair_under_anchor() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        // 240 Mb genome at 2.5 Mb bins is 96 bins, 8 px each
        let mut state = state(0, 0, 0.0, 8.0);

        // x lands in chr2 (bins 40..72), y in chr3 (bins 72..96)
        let outcome = zoom_and_center(&mut state, &ctx, false, ZoomDirection::In, 400.0, 700.0)
            .await
            .unwrap();

        assert_eq!((state.chr1_index(), state.chr2_index()), (2, 3));
        assert!(outcome.chr_changed);
    }

    #[tokio::test]
    async fn whole_genome_ignores_zoom_out_and_outside_clicks() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(0, 0, 0.0, 8.0);

        zoom_and_center(&mut state, &ctx, false, ZoomDirection::Out, 10.0, 10.0)
            .await
            .unwrap();
        pinch_zoom(&mut state, &ctx, false, 10.0, 10.0, 0.5).await.unwrap();
        zoom_and_center(&mut state, &ctx, false, ZoomDirection::In, 790.0, 790.0)
            .await
            .unwrap();

        assert_eq!((state.chr1_index(), state.zoom_index()), (0, 0));
    }

    #[tokio::test]
    async fn double_click_steps_one_resolution() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 2, 10.0, 2.0);

        let outcome = zoom_and_center(&mut state, &ctx, false, ZoomDirection::In, 400.0, 400.0)
            .await
            .unwrap();

        assert_eq!(state.zoom_index(), 3);
        assert!(outcome.resolution_changed);
    }

    #[tokio::test]
    async fn double_click_at_finest_doubles_pixels() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 3, 100.0, 2.0);

        zoom_and_center(&mut state, &ctx, false, ZoomDirection::In, 400.0, 400.0)
            .await
            .unwrap();

        assert_eq!(state.zoom_index(), 3);
        assert_eq!(state.pixel_size(), 4.0);
    }

    #[tokio::test]
    async fn double_click_out_at_minimum_shows_whole_genome() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 2, 0.0, 4.0);

        let outcome = zoom_and_center(&mut state, &ctx, false, ZoomDirection::Out, 400.0, 400.0)
            .await
            .unwrap();

        assert_eq!((state.chr1_index(), state.chr2_index()), (0, 0));
        assert_eq!(outcome, TransitionOutcome { chr_changed: true, resolution_changed: true });
    }

    #[tokio::test]
    async fn double_click_out_at_minimum_without_overview_stays_on_pair() {
        let dataset = dataset(false);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(0, 2, 0.0, 4.0);

        zoom_and_center(&mut state, &ctx, false, ZoomDirection::Out, 400.0, 400.0)
            .await
            .unwrap();

        assert_eq!((state.chr1_index(), state.zoom_index()), (0, 2));
        assert_eq!(state.pixel_size(), 4.0);
    }

    #[tokio::test]
    async fn invariants_hold_across_gestures() {
        let dataset = dataset(true);
        let ctx = NavigationContext::new(&dataset, viewport());
        let mut state = state(1, 2, 0.0, 1.6);
        let gestures = [1.5, 3.0, 0.7, 8.0, 0.2, 2.0, 0.9, 16.0];

        for (step, factor) in gestures.into_iter().enumerate() {
            let anchor = 100.0 * step as f64;
            pinch_zoom(&mut state, &ctx, false, anchor, 800.0 - anchor, factor)
                .await
                .unwrap();
            assert!(state.chr1_index() <= state.chr2_index());
            assert!((1.0..=shared::MAX_PIXEL_SIZE).contains(&state.pixel_size()));
            assert!(state.bin_x() >= 0.0 && state.bin_y() >= 0.0);
        }
    }
}
