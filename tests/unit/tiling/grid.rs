use super::*;

fn td(x_start: u32, y_start: u32, x_end: u32, y_end: u32) -> TileDescriptor {
    TileDescriptor {
        x_start,
        y_start,
        x_end,
        y_end,
    }
}

fn covered(tiles: &[TileDescriptor], x: u32, y: u32) -> bool {
    tiles.iter().any(|t| t.contains(x, y))
}

#[test]
fn scenario_2000x1500_is_a_2x2_grid() {
    let grid = TileGrid::new(2000, 1500, 1024, 16).unwrap();
    assert_eq!((grid.tiles_x, grid.tiles_y), (2, 2));

    let tiles = grid.descriptors();
    assert_eq!(
        tiles,
        vec![
            td(0, 0, 1040, 1040),
            td(1008, 0, 2000, 1040),
            td(0, 1008, 1040, 1500),
            td(1008, 1008, 2000, 1500),
        ]
    );
}

#[test]
fn tiles_are_row_major() {
    let tiles = partition(300, 200, 100, 8).unwrap();
    assert_eq!(tiles.len(), 6);
    for pair in tiles.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(b.y_start > a.y_start || (b.y_start == a.y_start && b.x_start > a.x_start));
    }
}

#[test]
fn partition_covers_every_pixel_and_stays_in_bounds() {
    for &(w, h, ts, ov) in &[
        (1, 1, 1, 0),
        (17, 5, 4, 2),
        (64, 64, 64, 16),
        (65, 33, 16, 15),
        (100, 7, 3, 2),
        (37, 91, 10, 0),
    ] {
        let tiles = partition(w, h, ts, ov).unwrap();
        assert_eq!(
            tiles.len(),
            (w.div_ceil(ts) * h.div_ceil(ts)) as usize,
            "{w}x{h} ts={ts}"
        );
        for t in &tiles {
            assert!(t.x_start < t.x_end && t.x_end <= w, "{t} in {w}x{h}");
            assert!(t.y_start < t.y_end && t.y_end <= h, "{t} in {w}x{h}");
        }
        for y in 0..h {
            for x in 0..w {
                assert!(covered(&tiles, x, y), "({x}, {y}) uncovered in {w}x{h} ts={ts}");
            }
        }
    }
}

#[test]
fn overlap_pads_interior_edges_only_up_to_the_raster() {
    let grid = TileGrid::new(50, 50, 20, 5).unwrap();
    let middle = grid.descriptor(1, 1);
    assert_eq!(middle, td(15, 15, 45, 45));
    let corner = grid.descriptor(2, 2);
    assert_eq!(corner, td(35, 35, 50, 50));
}

#[test]
fn partition_is_idempotent() {
    assert_eq!(
        partition(4321, 1234, 512, 16).unwrap(),
        partition(4321, 1234, 512, 16).unwrap()
    );
}

#[test]
fn partition_rejects_bad_geometry() {
    assert!(partition(10, 10, 0, 16).is_err());
    assert!(partition(0, 10, 4, 0).is_err());
}

#[test]
fn overlap_wider_than_a_tile_shares_starts() {
    let tiles = partition(30, 5, 10, 16).unwrap();
    assert_eq!(
        tiles,
        vec![td(0, 0, 26, 5), td(0, 0, 30, 5), td(4, 0, 30, 5)]
    );
    for x in 0..30 {
        assert!(covered(&tiles, x, 4));
    }
}

#[test]
fn should_tile_needs_size_and_area() {
    assert!(should_tile(2000, 1500, 1024, 1_000_000));
    assert!(!should_tile(2000, 1500, 0, 1_000_000));
    assert!(!should_tile(500, 400, 1024, 1_000_000));
    assert!(!should_tile(1000, 1000, 512, 1_000_000));
    assert!(should_tile(1001, 1000, 512, 1_000_000));
    assert!(!should_tile(1200, 1000, 2048, 1_000_000));
}
