use grid_contours::{isolines, ContourPaths, Isoliner};

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

/// True if `path` visits exactly the given points, in any order
fn same_point_set(path: &[(f64, f64)], expected: &[(f64, f64)]) -> bool {
    path.len() == expected.len()
        && expected
            .iter()
            .all(|e| path.iter().any(|p| approx(*p, *e)))
}

/// Normalise a closed polyline: drop the duplicated closing vertex and
/// rotate so the lexicographically smallest vertex comes first
fn normalize_ring(path: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let ring = &path[..path.len() - 1];
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
fn test_single_spike_closed_isoline() {
    // a central spike of height 1 on a flat plain; the 0.5 level traces a
    // diamond around it
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];

    let results = isolines(&xs, &ys, &z, 3, 3, &[0.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(path.len(), 5, "closed loop repeats its starting vertex");
    assert!(approx(path[0], path[4]));
    assert!(same_point_set(
        &path[..4],
        &[(0.5, 1.0), (1.0, 0.5), (1.5, 1.0), (1.0, 1.5)]
    ));
}

#[test]
fn test_flat_plateau_is_empty() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0; 9];

    let results = isolines(&xs, &ys, &z, 3, 3, &[0.5]).unwrap();

    assert!(results[0].is_empty());
    assert_eq!(results[0].path_count(), 0);
}

#[test]
fn test_saddle_centre_on_level_keeps_topology() {
    // 2x2 checkerboard cell; the centre mean equals the level exactly, which
    // is not strictly below it, so the segments are not swapped
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let z = [0.0, 1.0, 1.0, 0.0];

    let results = isolines(&xs, &ys, &z, 2, 2, &[0.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 2, "saddle splits into two polylines");
    assert_eq!(results[0].ids(), &[1, 1, 2, 2]);

    let expect_a = [(1.0, 0.5), (0.5, 1.0)];
    let expect_b = [(0.5, 0.0), (0.0, 0.5)];
    assert!(
        (same_point_set(&paths[0], &expect_a) && same_point_set(&paths[1], &expect_b))
            || (same_point_set(&paths[0], &expect_b) && same_point_set(&paths[1], &expect_a))
    );
}

#[test]
fn test_saddle_centre_below_level_swaps() {
    // same corner pattern, but the level is above the centre mean of 0.5, so
    // the two lines hug the opposite diagonal
    let xs = [0.0, 1.0];
    let ys = [0.0, 1.0];
    let z = [0.0, 1.0, 1.0, 0.0];

    let results = isolines(&xs, &ys, &z, 2, 2, &[0.6]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 2);
    let expect_a = [(0.0, 0.6), (0.4, 1.0)];
    let expect_b = [(0.6, 0.0), (1.0, 0.4)];
    assert!(
        (same_point_set(&paths[0], &expect_a) && same_point_set(&paths[1], &expect_b))
            || (same_point_set(&paths[0], &expect_b) && same_point_set(&paths[1], &expect_a))
    );
}

#[test]
fn test_gradient_grid_straight_line() {
    // values rise left to right; the 12.5 level is a straight vertical line
    let xs = [0.0, 1.0, 2.0, 3.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [
        5.0, 5.0, 5.0, // column 0
        10.0, 10.0, 10.0, // column 1
        15.0, 15.0, 15.0, // column 2
        20.0, 20.0, 20.0, // column 3
    ];

    let results = isolines(&xs, &ys, &z, 3, 4, &[12.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(path.len(), 3);
    for &(x, _) in path {
        assert!((x - 1.5).abs() < EPS);
    }
    // open polyline runs boundary to boundary
    let endpoint_ys: Vec<f64> = vec![path[0].1, path[2].1];
    assert!(endpoint_ys.contains(&0.0));
    assert!(endpoint_ys.contains(&2.0));
}

#[test]
fn test_non_finite_corner_disables_touching_cell() {
    // NaN in the bottom-left corner: the cell containing it emits nothing,
    // the rest of the level line survives
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [
        f64::NAN, 0.0, 0.0, // column 0
        1.0, 1.0, 1.0, // column 1
        1.0, 1.0, 1.0, // column 2
    ];

    let results = isolines(&xs, &ys, &z, 3, 3, &[0.5]).unwrap();
    let paths = paths_of(&results[0]);

    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(path.len(), 2, "only the clean cell contributes");
    assert!(same_point_set(path, &[(0.5, 1.0), (0.5, 2.0)]));
}

#[test]
fn test_engine_reuse_is_order_independent() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    let levels = [0.1, 0.5, 0.9];

    let mut engine = Isoliner::new(&xs, &ys, &z, 3, 3).unwrap();

    let mut forward = Vec::new();
    for &level in &levels {
        engine.set_level(level);
        engine.compute().unwrap();
        forward.push(engine.collect().unwrap());
    }

    let mut backward = Vec::new();
    for &level in levels.iter().rev() {
        engine.set_level(level);
        engine.compute().unwrap();
        backward.push(engine.collect().unwrap());
    }
    backward.reverse();

    for (f, b) in forward.iter().zip(&backward) {
        assert_eq!(f.len(), b.len());
        assert_eq!(f.path_count(), b.path_count());

        // all paths here are closed diamonds; compare modulo the rotation of
        // the starting vertex
        let fp = paths_of(f);
        let bp = paths_of(b);
        for (pf, pb) in fp.iter().zip(&bp) {
            assert_eq!(normalize_ring(pf), normalize_ring(pb));
        }
    }
}

#[test]
fn test_multiple_levels_in_one_call() {
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 2.0];
    let z = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];

    let results = isolines(&xs, &ys, &z, 3, 3, &[0.25, 0.5, 0.75, 1.5]).unwrap();

    assert_eq!(results.len(), 4);
    for result in &results[..3] {
        assert_eq!(result.path_count(), 1);
        assert_eq!(result.len(), 5);
    }
    // nothing exceeds the spike height
    assert!(results[3].is_empty());
}
