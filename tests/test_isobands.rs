use grid_contours::{isobands, ContourPaths, Isobander};

const EPS: f64 = 1e-12;

/// Group the flat output buffers into one vertex list per path
fn paths_of(result: &ContourPaths<f64>) -> Vec<Vec<(f64, f64)>> {
    result
        .paths()
        .map(|(_, xs, ys)| xs.iter().copied().zip(ys.iter().copied()).collect())
        .collect()
}

fn approx(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < EPS && (a.1 - b.1).abs() < EPS
}

fn same_point_set(path: &[(f64, f64)], expected: &[(f64, f64)]) -> bool {
    path.len() == expected.len()
        && expected
            .iter()
            .all(|e| path.iter().any(|p| approx(*p, *e)))
}

/// Rotate a ring so the lexicographically smallest vertex comes first
fn normalize_ring(ring: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let pivot = ring
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    let mut out = Vec::with_capacity(ring.len());
    out.extend_from_slice(&ring[pivot..]);
    out.extend_from_slice(&ring[..pivot]);
    out
}

#[test]
fn test_single_cell_hexagon_band() {
    // one cell straddling both levels: the band boundary is a hexagon
    // cutting across the middle of the cell
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let z = [0.0, 2.0, 1.0, 3.0];

    let results = isobands(&xs, &ys, &z, 2, 2, &[0.5], &[2.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 1);
    let ring = normalize_ring(&paths[0]);
    let expected = normalize_ring(&[
        (1.0, 0.0),
        (1.0, 0.75),
        (0.5, 1.0),
        (0.0, 1.0),
        (0.0, 0.25),
        (0.5, 0.0),
    ]);
    assert_eq!(ring.len(), 6);
    for (a, b) in ring.iter().zip(&expected) {
        assert!(approx(*a, *b), "{ring:?} != {expected:?}");
    }
}

#[test]
fn test_band_outside_range_is_empty() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0; 9];

    let results = isobands(&xs, &ys, &z, 3, 3, &[0.5], &[1.5]).unwrap();

    assert!(results[0].is_empty());
}

#[test]
fn test_all_within_collapses_to_perimeter_ring() {
    // every cell is entirely inside the band; all interior edges cancel and
    // a single ring around the grid boundary remains
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0; 9];

    let results = isobands(&xs, &ys, &z, 3, 3, &[-1.0], &[1.0]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 1);
    assert!(same_point_set(
        &paths[0],
        &[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (0.0, 2.0),
            (0.0, 1.0),
        ]
    ));
}

#[test]
fn test_annulus_gives_outer_ring_and_hole() {
    // a plateau ring of in-band values around an above-band peak: the band
    // region is an annulus, so its boundary is two separate rings
    let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
    let ys = [0.0, 1.0, 2.0, 3.0, 4.0];
    #[rustfmt::skip]
    let z = [
        5.0,  5.0,  5.0,  5.0, 5.0, // column 0
        5.0, 15.0, 15.0, 15.0, 5.0, // column 1
        5.0, 15.0, 25.0, 15.0, 5.0, // column 2
        5.0, 15.0, 15.0, 15.0, 5.0, // column 3
        5.0,  5.0,  5.0,  5.0, 5.0, // column 4
    ];

    let results = isobands(&xs, &ys, &z, 5, 5, &[10.0], &[20.0]).unwrap();

    assert_eq!(results[0].path_count(), 2);

    // the two rings are the outer boundary and the hole around the peak;
    // the hole is strictly inside the outer ring's bounding box
    let paths = paths_of(&results[0]);
    let (small, large) = if paths[0].len() < paths[1].len() {
        (&paths[0], &paths[1])
    } else {
        (&paths[1], &paths[0])
    };
    let max_x_small = small.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let max_x_large = large.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    assert!(max_x_small < max_x_large);
}

#[test]
fn test_eight_sided_saddle_centre_within() {
    // opposite corners above, the others below; the centre mean falls inside
    // the band, so the boundary is one connected 8-gon
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let z = [3.0, 0.0, 0.0, 3.0];

    let results = isobands(&xs, &ys, &z, 2, 2, &[1.0], &[2.0]).unwrap();

    assert_eq!(results[0].path_count(), 1);
    assert_eq!(results[0].len(), 8);
}

#[test]
fn test_eight_sided_saddle_centre_below() {
    // same corner pattern with the centre mean below the band: the band
    // splits into two disjoint quadrilaterals
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let z = [3.0, 0.0, 0.0, 3.0];

    let results = isobands(&xs, &ys, &z, 2, 2, &[2.0], &[2.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].len(), 4);
    assert_eq!(paths[1].len(), 4);
}

#[test]
fn test_eight_sided_saddle_centre_above() {
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let z = [3.0, 0.0, 0.0, 3.0];

    // centre mean 1.5 >= vhi 1.2: two quadrilaterals with the opposite pairing
    let results = isobands(&xs, &ys, &z, 2, 2, &[0.5], &[1.2]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].len(), 4);
    assert_eq!(paths[1].len(), 4);
}

#[test]
fn test_checkerboard_shares_vertices_between_rings() {
    // alternating in-band corners force rings that legitimately touch at
    // shared grid points; the stitcher must keep them separate without
    // corrupting either walk
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

    let results = isobands(&xs, &ys, &z, 3, 3, &[0.5], &[1.5]).unwrap();

    assert!(!results[0].is_empty());
    // ids are monotone and rings are non-degenerate
    let ids = results[0].ids();
    for w in ids.windows(2) {
        assert!(w[0] <= w[1]);
    }
    for path in paths_of(&results[0]) {
        assert!(path.len() >= 3);
    }
}

#[test]
fn test_saddle_lattice_with_shared_vertices() {
    // a 0/2 checkerboard makes every cell an 8-sided saddle whose centre
    // mean sits inside the band; neighbouring octagons share both crossings
    // of each common cell edge, so every merge path gets exercised
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 0.0];

    let results = isobands(&xs, &ys, &z, 3, 3, &[0.5], &[1.5]).unwrap();
    let result = &results[0];

    assert!(!result.is_empty());
    for w in result.ids().windows(2) {
        assert!(w[0] <= w[1]);
    }
    for path in paths_of(result) {
        assert!(path.len() >= 3);
        // no vertex may repeat within a single ring
        for (i, a) in path.iter().enumerate() {
            for b in &path[i + 1..] {
                assert!(!approx(*a, *b), "duplicate vertex {a:?} in ring");
            }
        }
    }
}

#[test]
fn test_ring_fragments_meeting_at_shared_vertex() {
    // the NaN suppresses the top-left cell, so the fragments emitted by the
    // two cells diagonal to each other meet only at the centre corner; the
    // stitcher must hold both connectivities at that vertex until the last
    // cell joins everything into a single ring
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [f64::NAN, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];

    let results = isobands(&xs, &ys, &z, 3, 3, &[0.5], &[1.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 1);
    assert!(same_point_set(
        &paths[0],
        &[(1.0, 1.0), (1.0, 0.5), (1.5, 1.0), (1.0, 1.5), (0.5, 1.0)]
    ));
}

#[test]
fn test_non_finite_corner_disables_touching_cell() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [f64::NAN, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5];

    let results = isobands(&xs, &ys, &z, 3, 3, &[0.0], &[1.0]).unwrap();
    let paths = paths_of(&results[0]);

    // the three clean cells merge into one L-shaped ring
    assert_eq!(paths.len(), 1);
    assert!(same_point_set(
        &paths[0],
        &[
            (1.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (0.0, 2.0),
            (0.0, 1.0),
            (1.0, 1.0),
        ]
    ));
}

#[test]
fn test_affine_remap_preserves_topology() {
    let xs = [0.0, 1.0, 2.0, 3.0];
    let ys = [0.0, 1.0, 2.0];
    let z: Vec<f64> = (0..12).map(|i| f64::from(i % 4)).collect();

    let base = isobands(&xs, &ys, &z, 3, 4, &[0.5], &[2.5]).unwrap();

    let xs2: Vec<f64> = xs.iter().map(|&x| 2.0 * x + 3.0).collect();
    let ys2: Vec<f64> = ys.iter().map(|&y| 3.0 * y + 1.0).collect();
    let remapped = isobands(&xs2, &ys2, &z, 3, 4, &[0.5], &[2.5]).unwrap();

    assert_eq!(base[0].path_count(), remapped[0].path_count());
    assert_eq!(base[0].len(), remapped[0].len());

    // path order depends on hash iteration, so compare as sorted ring sets
    let mut mapped: Vec<Vec<(f64, f64)>> = paths_of(&base[0])
        .iter()
        .map(|pb| {
            normalize_ring(
                &pb.iter()
                    .map(|&(x, y)| (2.0 * x + 3.0, 3.0 * y + 1.0))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    let mut actual: Vec<Vec<(f64, f64)>> = paths_of(&remapped[0])
        .iter()
        .map(|pr| normalize_ring(pr))
        .collect();
    mapped.sort_by(|a, b| a.partial_cmp(b).unwrap());
    actual.sort_by(|a, b| a.partial_cmp(b).unwrap());

    for (pm, pa) in mapped.iter().zip(&actual) {
        assert_eq!(pm.len(), pa.len());
        for (a, b) in pm.iter().zip(pa) {
            assert!(approx(*a, *b));
        }
    }
}

#[test]
fn test_open_band_agrees_with_isoline_crossings() {
    // a band open at the bottom ends exactly at the single-level isoline:
    // every isoline vertex must appear among the band's boundary vertices
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];

    let bands = isobands(&xs, &ys, &z, 3, 3, &[f64::NEG_INFINITY], &[0.5]).unwrap();
    let lines = grid_contours::isolines(&xs, &ys, &z, 3, 3, &[0.5]).unwrap();

    let band_vertices: Vec<(f64, f64)> = bands[0]
        .xs()
        .iter()
        .copied()
        .zip(bands[0].ys().iter().copied())
        .collect();

    for (&x, &y) in lines[0].xs().iter().zip(lines[0].ys()) {
        assert!(
            band_vertices.iter().any(|&p| approx(p, (x, y))),
            "isoline vertex ({x}, {y}) missing from band boundary"
        );
    }
}

#[test]
fn test_engine_reuse_is_order_independent() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let bands = [(0.1, 0.4), (0.4, 0.7), (0.7, 1.1)];

    let mut engine = Isobander::new(&xs, &ys, &z, 3, 3).unwrap();

    let mut forward = Vec::new();
    for &(lo, hi) in &bands {
        engine.set_levels(lo, hi);
        engine.compute().unwrap();
        forward.push(engine.collect().unwrap());
    }

    let mut backward = Vec::new();
    for &(lo, hi) in bands.iter().rev() {
        engine.set_levels(lo, hi);
        engine.compute().unwrap();
        backward.push(engine.collect().unwrap());
    }
    backward.reverse();

    for (f, b) in forward.iter().zip(&backward) {
        assert_eq!(f.len(), b.len());
        assert_eq!(f.path_count(), b.path_count());

        let mut fp: Vec<_> = paths_of(f).iter().map(|p| normalize_ring(p)).collect();
        let mut bp: Vec<_> = paths_of(b).iter().map(|p| normalize_ring(p)).collect();
        fp.sort_by(|a, b| a.partial_cmp(b).unwrap());
        bp.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (pf, pb) in fp.iter().zip(&bp) {
            assert_eq!(pf.len(), pb.len());
            for (a, b) in pf.iter().zip(pb) {
                assert!(approx(*a, *b));
            }
        }
    }
}
