use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use super::*;
use crate::{
    foundation::config::Scale,
    transform::backend::{ResampleTransform, TransformKind},
};

/// Nearest-neighbour transform that records every input size it sees.
struct Recording {
    scale: Scale,
    calls: AtomicUsize,
    sizes: Mutex<Vec<(u32, u32)>>,
    fail_width: Option<u32>,
    shrink_width: Option<u32>,
}

impl Recording {
    fn new(factor: u32) -> Self {
        Self {
            scale: Scale::new(factor).unwrap(),
            calls: AtomicUsize::new(0),
            sizes: Mutex::new(Vec::new()),
            fail_width: None,
            shrink_width: None,
        }
    }
}

impl Transform for Recording {
    fn scale(&self) -> Scale {
        self.scale
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn apply(&self, tile: &Raster) -> anyhow::Result<Raster> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().unwrap().push((tile.width, tile.height));
        if Some(tile.width) == self.fail_width {
            anyhow::bail!("device lost");
        }
        if Some(tile.width) == self.shrink_width {
            return Ok(Raster::new(tile.width, tile.height));
        }
        Ok(tile.replicate(self.scale.factor()))
    }
}

fn quiet(factor: u32) -> PipelineConfig {
    PipelineConfig {
        show_progress: false,
        ..PipelineConfig::with_scale(Scale::new(factor).unwrap())
    }
}

fn pattern(w: u32, h: u32) -> Raster {
    let mut r = Raster::new(w, h);
    for y in 0..h {
        for x in 0..w {
            r.put_pixel(x, y, [(x % 251) as u8, (y % 241) as u8, ((x + 3 * y) % 239) as u8]);
        }
    }
    r
}

#[test]
fn stage_transitions_follow_the_two_paths() {
    use Stage::*;
    assert!(Idle.can_advance_to(Partitioning));
    assert!(Partitioning.can_advance_to(Dispatching));
    assert!(Dispatching.can_advance_to(Compositing));
    assert!(Compositing.can_advance_to(Done));
    assert!(Idle.can_advance_to(SingleShot));
    assert!(SingleShot.can_advance_to(Done));

    assert!(!Idle.can_advance_to(Compositing));
    assert!(!SingleShot.can_advance_to(Dispatching));
    assert!(!Done.can_advance_to(Idle));

    let mut cursor = StageCursor(Idle);
    cursor.advance(SingleShot).unwrap();
    assert!(cursor.advance(Compositing).is_err());
}

#[test]
fn small_input_is_transformed_once_whole() {
    let src = pattern(500, 400);
    let transform = Recording::new(3);
    let out = run_pipeline(&src, &transform, &quiet(3)).unwrap();

    assert_eq!(transform.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*transform.sizes.lock().unwrap(), vec![(500, 400)]);
    assert_eq!((out.canvas.width, out.canvas.height), (1500, 1200));
    assert_eq!(out.stats.mode, PipelineMode::SingleShot);
    assert_eq!(out.stats.tiles_total, 1);
    assert!(out.mismatches.is_empty());
}

#[test]
fn inputs_at_or_below_the_area_threshold_never_tile() {
    for &(w, h) in &[(1000, 1000), (2000, 500), (1, 1_000_000), (1025, 900)] {
        let transform = Recording::new(2);
        let out = run_pipeline(&pattern(w, h), &transform, &quiet(2)).unwrap();
        assert_eq!(transform.calls.load(Ordering::SeqCst), 1, "{w}x{h}");
        assert_eq!(out.stats.mode, PipelineMode::SingleShot);
    }
}

#[test]
fn large_input_is_tiled_into_a_seamless_canvas() {
    let src = pattern(2000, 1500);
    let transform = Recording::new(2);
    let out = run_pipeline(&src, &transform, &quiet(2)).unwrap();

    assert_eq!(
        out.stats.mode,
        PipelineMode::Tiled {
            tiles_x: 2,
            tiles_y: 2
        }
    );
    assert_eq!(transform.calls.load(Ordering::SeqCst), 4);
    assert_eq!((out.canvas.width, out.canvas.height), (4000, 3000));
    assert_eq!(out.stats.tiles_total, 4);
    assert_eq!(out.stats.tiles_degraded, 0);
    assert_eq!(out.canvas, src.replicate(2));
}

#[test]
fn tile_size_within_overlap_still_bypasses_small_inputs() {
    let config = PipelineConfig {
        tile_size: 16,
        ..quiet(3)
    };
    let transform = Recording::new(3);
    let out = run_pipeline(&Raster::new(500, 400), &transform, &config).unwrap();

    assert_eq!(transform.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.stats.mode, PipelineMode::SingleShot);
    assert_eq!((out.canvas.width, out.canvas.height), (1500, 1200));
}

#[test]
fn overlap_wider_than_tiles_still_composites_seamlessly() {
    let src = pattern(1100, 1000);
    let config = PipelineConfig {
        tile_size: 300,
        overlap: 400,
        ..quiet(2)
    };
    let transform = Recording::new(2);
    let out = run_pipeline(&src, &transform, &config).unwrap();

    assert_eq!(
        out.stats.mode,
        PipelineMode::Tiled {
            tiles_x: 4,
            tiles_y: 4
        }
    );
    assert!(out.mismatches.is_empty());
    assert_eq!(out.canvas, src.replicate(2));
}

#[test]
fn hand_built_raster_with_short_buffer_is_rejected() {
    let src = Raster {
        width: 2000,
        height: 1500,
        data: Vec::new(),
    };
    let transform = Recording::new(2);
    let err = run_pipeline(&src, &transform, &quiet(2)).unwrap_err();
    assert!(matches!(err, UpscaleError::Validation(_)));
    assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_tile_size_disables_tiling() {
    let config = PipelineConfig {
        tile_size: 0,
        ..quiet(2)
    };
    let transform = Recording::new(2);
    let out = run_pipeline(&pattern(1500, 1500), &transform, &config).unwrap();
    assert_eq!(transform.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.stats.mode, PipelineMode::SingleShot);
}

#[test]
fn failing_tile_fails_the_run() {
    let mut transform = Recording::new(2);
    transform.fail_width = Some(992);
    let err = run_pipeline(&pattern(2000, 1500), &transform, &quiet(2)).unwrap_err();
    match err {
        UpscaleError::TileTransformFailure { index, tile, .. } => {
            assert_eq!(index, 1);
            assert_eq!((tile.x_start, tile.x_end), (1008, 2000));
            assert_eq!((tile.y_start, tile.y_end), (0, 1040));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn undersized_tile_degrades_but_completes() {
    let mut transform = Recording::new(2);
    transform.shrink_width = Some(992);
    let out = run_pipeline(&pattern(2000, 1500), &transform, &quiet(2)).unwrap();

    assert_eq!(out.stats.tiles_degraded, 2);
    assert_eq!(out.mismatches.len(), 2);
    assert_eq!(out.mismatches[0].index, 1);
    assert_eq!(out.mismatches[1].index, 3);
    assert_eq!(out.canvas.pixel(3000, 10), Some([0, 0, 0]));
    assert_eq!(out.canvas.pixel(10, 10), pattern(2000, 1500).pixel(5, 5));
}

#[test]
fn single_shot_size_mismatch_is_a_failure() {
    let mut transform = Recording::new(2);
    transform.shrink_width = Some(300);
    let err = run_pipeline(&pattern(300, 200), &transform, &quiet(2)).unwrap_err();
    assert!(matches!(err, UpscaleError::TileTransformFailure { index: 0, .. }));
    assert!(err.to_string().contains("expected 600x400"));
}

#[test]
fn transform_scale_must_match_config() {
    let transform = ResampleTransform::new(TransformKind::Nearest, Scale::new(3).unwrap());
    let err = run_pipeline(&pattern(10, 10), &transform, &quiet(2)).unwrap_err();
    assert!(matches!(err, UpscaleError::InvalidScale(3)));
}

#[test]
fn empty_source_is_rejected() {
    let transform = Recording::new(2);
    assert!(run_pipeline(&Raster::new(0, 0), &transform, &quiet(2)).is_err());
    assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn throughput_is_megapixels_per_second() {
    let stats = UpscaleStats {
        mode: PipelineMode::SingleShot,
        input_width: 2000,
        input_height: 1000,
        output_width: 4000,
        output_height: 2000,
        tiles_total: 1,
        tiles_degraded: 0,
        elapsed: Duration::from_secs(2),
    };
    assert!((stats.input_megapixels_per_sec() - 1.0).abs() < 1e-9);
    assert!((stats.output_megapixels_per_sec() - 4.0).abs() < 1e-9);

    let instant = UpscaleStats {
        elapsed: Duration::ZERO,
        ..stats
    };
    assert_eq!(instant.input_megapixels_per_sec(), 0.0);
}
