//! Tests for patrol module

use patroltrace::patrol::{
    CycleMatch, find_first_cycle_closure, find_loop_closure, find_repeating_cycle,
};
use patroltrace::{
    CycleConfig, PatrolConfig, Point3, analyze_path, extract_cycle_greedy, find_sharp_rotations,
    is_loop, is_reverse, rotate_start, split_path_at_indices, trim_to_first_cycle,
    trim_to_full_loop,
};

fn p(x: f64, y: f64) -> Point3 {
    Point3::new(x, y, 0.0)
}

/// One counter-clockwise lap of a 5x5 square, unit steps, not closed.
fn square_lap() -> Vec<Point3> {
    let mut points = Vec::with_capacity(20);
    points.extend((0..5).map(|k| p(k as f64, 0.0)));
    points.extend((0..5).map(|k| p(5.0, k as f64)));
    points.extend((0..5).map(|k| p(5.0 - k as f64, 5.0)));
    points.extend((0..5).map(|k| p(0.0, 5.0 - k as f64)));
    points
}

/// Two consecutive laps ending back on the start (41 points).
fn two_laps_closed() -> Vec<Point3> {
    let lap = square_lap();
    let mut points = lap.clone();
    points.extend(lap);
    points.push(p(0.0, 0.0));
    points
}

/// Heading of travel toward the next point, last one repeated.
fn headings_of(points: &[Point3]) -> Vec<f64> {
    let mut h: Vec<f64> = points
        .windows(2)
        .map(|w| (w[1].y - w[0].y).atan2(w[1].x - w[0].x).to_degrees())
        .collect();
    h.push(*h.last().unwrap());
    h
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_is_loop() {
    let p0 = p(0.0, 0.0);
    assert!(is_loop(&[p0, p(1.0, 0.0), p(1.0, 1.0), p0], 0.0));
    assert!(!is_loop(&[p0, p(1.0, 0.0), p(1.0, 1.0)], 0.5));
    // Boundary is inclusive
    assert!(is_loop(&[p0, p(3.0, 3.0), p(0.5, 0.0)], 0.5));
    assert!(!is_loop(&[p0], 10.0));
    assert!(!is_loop(&[], 10.0));
}

#[test]
fn test_is_reverse() {
    let a = p(0.0, 0.0);
    let b = p(1.0, 0.0);
    let c = p(2.0, 0.0);
    assert!(is_reverse(&[a, b, c, b, a], 0.0));
    assert!(is_reverse(&[a, b, b, a], 0.0));
    assert!(!is_reverse(&[a, b, c, p(3.0, 0.0), p(4.0, 0.0)], 0.0));
    assert!(is_reverse(&[a, b, c, p(1.1, 0.0), p(0.0, 0.1)], 0.15));
    assert!(!is_reverse(&[a], 0.0));
}

#[test]
fn test_loop_and_reverse_are_independent() {
    let a = p(0.0, 0.0);
    let b = p(1.0, 0.0);
    let out_and_back = [a, b, p(2.0, 0.0), b, a];
    assert!(is_loop(&out_and_back, 0.0));
    assert!(is_reverse(&out_and_back, 0.0));
}

// ============================================================================
// Loop trimming
// ============================================================================

#[test]
fn test_trim_to_full_loop() {
    let points = vec![
        p(0.0, 0.0),
        p(0.1, 0.0), // too early to count
        p(1.0, 0.0),
        p(1.0, 1.0),
        p(0.0, 0.1),
        p(-1.0, 0.0),
    ];
    assert_eq!(find_loop_closure(&points, 0.2, 3), Some(4));

    let trimmed = trim_to_full_loop(&points, 0.2, 3);
    assert_eq!(trimmed.len(), 6);
    assert_eq!(&trimmed[..5], &points[..5]);
    assert_eq!(trimmed[5], points[0]);

    // Without the minimum length the second point closes immediately
    assert_eq!(find_loop_closure(&points, 0.2, 0), Some(1));
}

#[test]
fn test_trim_to_full_loop_no_closure() {
    let points = vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0)];
    assert_eq!(trim_to_full_loop(&points, 0.5, 1), points);
    assert!(trim_to_full_loop(&[], 0.5, 1).is_empty());
}

#[test]
fn test_trim_to_first_cycle() {
    let points = two_laps_closed();
    let trimmed = trim_to_first_cycle(&points, 0.5, 3);
    assert_eq!(trimmed.len(), 21);
    assert_eq!(trimmed[20], points[0]);
}

#[test]
fn test_trim_to_first_cycle_picks_deepest_minimum() {
    // Two near-returns to the start: index 2 (0.8 away) then index 4 (0.3 away)
    let points = vec![
        p(0.0, 0.0),
        p(3.0, 0.0),
        p(0.8, 0.0),
        p(3.0, 1.0),
        p(0.3, 0.0),
        p(3.0, 0.0),
        p(4.0, 0.0),
    ];
    assert_eq!(find_first_cycle_closure(&points, 1.0, 2), Some(4));
    assert_eq!(trim_to_first_cycle(&points, 1.0, 2), points[..=4].to_vec());

    // Deeper minimum wins even when the shallower one is also in tolerance
    assert_eq!(find_first_cycle_closure(&points, 0.5, 2), Some(4));
}

#[test]
fn test_trim_to_first_cycle_needs_local_minimum() {
    // Distance to start only grows: no closure
    let points: Vec<Point3> = (0..12).map(|i| p(i as f64, 0.0)).collect();
    assert_eq!(trim_to_first_cycle(&points, 100.0, 3), points);

    // Too short for the interior band
    let short = vec![p(0.0, 0.0), p(1.0, 0.0), p(0.0, 0.0), p(1.0, 0.0)];
    assert_eq!(trim_to_first_cycle(&short, 0.5, 3), short);
}

#[test]
fn test_trim_to_first_cycle_outside_tolerance() {
    // Closure point pushed 0.5 away from the start
    let mut shifted = two_laps_closed();
    shifted[20] = p(0.5, 0.0);
    assert_eq!(trim_to_first_cycle(&shifted, 0.25, 3), shifted);
    assert_eq!(trim_to_first_cycle(&shifted, 0.5, 3).len(), 21);
}

#[test]
fn test_rotate_start_open_path() {
    let points = vec![p(5.0, 0.0), p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)];
    assert_eq!(
        rotate_start(&points),
        vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(5.0, 0.0)]
    );
}

#[test]
fn test_rotate_start_keeps_ring_closed() {
    let points = vec![
        p(5.0, 0.0),
        p(0.0, 0.0),
        p(1.0, 0.0),
        p(2.0, 0.0),
        p(5.0, 0.0),
    ];
    assert_eq!(
        rotate_start(&points),
        vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(5.0, 0.0), p(0.0, 0.0)]
    );
}

#[test]
fn test_rotate_start_collapses_repeated_closure() {
    let p0 = p(0.0, 0.0);
    let points = vec![p0, p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p0, p0];
    assert_eq!(
        rotate_start(&points),
        vec![p0, p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p0]
    );
}

#[test]
fn test_rotate_start_ties_keep_original_start() {
    let mut lap = square_lap();
    lap.push(lap[0]);
    assert_eq!(rotate_start(&lap), lap);
    assert_eq!(rotate_start(&[p(1.0, 1.0)]), vec![p(1.0, 1.0)]);
}

// ============================================================================
// Cycle extraction
// ============================================================================

#[test]
fn test_extract_cycle_greedy_two_laps() {
    let points = two_laps_closed();
    let cycle = extract_cycle_greedy(&points, None, &CycleConfig::default()).unwrap();

    assert_eq!(cycle.len(), 21);
    assert_eq!(cycle.first(), cycle.last());
    assert_eq!(&cycle[..20], &square_lap()[..]);
}

#[test]
fn test_find_repeating_cycle_bounds() {
    let points = two_laps_closed();
    let found = find_repeating_cycle(&points, None, &CycleConfig::default()).unwrap();
    assert_eq!(
        found,
        Some(CycleMatch {
            start: 0,
            repeat_start: 20,
            end: 20
        })
    );
}

#[test]
fn test_extract_cycle_with_headings() {
    let points = two_laps_closed();
    let headings = headings_of(&points);
    let cycle = extract_cycle_greedy(&points, Some(&headings), &CycleConfig::default()).unwrap();
    assert_eq!(cycle.len(), 21);

    // Mismatched heading count is ignored rather than rejected
    let cycle = extract_cycle_greedy(&points, Some(&headings[1..]), &CycleConfig::default())
        .unwrap();
    assert_eq!(cycle.len(), 21);
}

#[test]
fn test_extract_cycle_no_repeat_returns_input() {
    let points: Vec<Point3> = (0..30).map(|i| p(i as f64, (i * i) as f64 * 0.1)).collect();
    let config = CycleConfig {
        similarity_threshold: 0.999,
        ..CycleConfig::default()
    };
    assert_eq!(extract_cycle_greedy(&points, None, &config).unwrap(), points);

    let short = square_lap();
    assert_eq!(
        extract_cycle_greedy(&short[..8], None, &CycleConfig::default()).unwrap(),
        short[..8].to_vec()
    );
}

#[test]
fn test_cycle_config_validation() {
    let points = two_laps_closed();
    for config in [
        CycleConfig {
            window_size: 0,
            ..CycleConfig::default()
        },
        CycleConfig {
            rotation_weight: 1.5,
            ..CycleConfig::default()
        },
        CycleConfig {
            min_segment_length: -1.0,
            ..CycleConfig::default()
        },
    ] {
        assert!(extract_cycle_greedy(&points, None, &config)
            .unwrap_err()
            .is_invalid_configuration());
    }
}

// ============================================================================
// Segmentation
// ============================================================================

#[test]
fn test_find_sharp_rotations() {
    assert_eq!(
        find_sharp_rotations(&[0.0, 10.0, 170.0, 175.0, -170.0], 150.0),
        vec![2]
    );
    // Wrapped delta of 170
    assert_eq!(find_sharp_rotations(&[170.0, -20.0], 150.0), vec![1]);
    // Threshold is inclusive
    assert_eq!(find_sharp_rotations(&[0.0, 150.0], 150.0), vec![1]);
    assert!(find_sharp_rotations(&[42.0], 150.0).is_empty());
}

#[test]
fn test_split_path_at_indices() {
    let points: Vec<Point3> = (0..10).map(|i| p(i as f64, 0.0)).collect();
    let pieces = split_path_at_indices(&points, &[3, 2, 3, 7, 12]);
    let lens: Vec<usize> = pieces.iter().map(|s| s.len()).collect();
    assert_eq!(lens, vec![3, 4, 3]);
    assert_eq!(pieces[1][0], p(3.0, 0.0));

    assert_eq!(split_path_at_indices(&points, &[]), vec![points.clone()]);
    assert!(split_path_at_indices(&[], &[1, 2]).is_empty());
}

#[test]
fn test_analyze_path_closed_square() {
    let mut points = square_lap();
    points.push(points[0]);

    let segments = analyze_path(&points, None, &PatrolConfig::default()).unwrap();
    assert_eq!(segments.len(), 1);

    let segment = &segments[0];
    assert!(segment.is_loop);
    assert!(!segment.is_reverse);
    assert_eq!(segment.start_index, 0);
    assert_eq!(segment.raw_len, 21);
    assert_eq!(segment.points.first(), segment.points.last());
}

#[test]
fn test_analyze_path_exact_closure_has_no_zero_length_edge() {
    let p0 = p(0.0, 0.0);
    let points = vec![p0, p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0), p0];
    let config = PatrolConfig {
        loop_tolerance: 0.1,
        ..PatrolConfig::default()
    };

    let segments = analyze_path(&points, None, &config).unwrap();
    assert_eq!(segments.len(), 1);
    let segment = &segments[0];
    assert!(segment.is_loop);
    assert!(segment.points.windows(2).all(|w| w[0] != w[1]));
    assert_eq!(segment.points, points);
}

#[test]
fn test_analyze_path_splits_on_headings() {
    // East along x to 10, then back west
    let mut points: Vec<Point3> = (0..=10).map(|x| p(x as f64, 0.0)).collect();
    points.extend((0..10).rev().map(|x| p(x as f64, 0.0)));
    let mut headings = vec![0.0; 10];
    headings.extend(vec![180.0; 11]);

    let segments = analyze_path(&points, Some(&headings), &PatrolConfig::default()).unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].start_index, 0);
    assert_eq!(segments[0].raw_len, 10);
    assert_eq!(segments[1].start_index, 10);
    assert_eq!(segments[1].raw_len, 11);
    assert!(!segments[0].is_loop);
    assert!(!segments[1].is_loop);
}

#[test]
fn test_analyze_path_geometric_fallback() {
    let mut points: Vec<Point3> = (0..=10).map(|x| p(x as f64, 0.0)).collect();
    points.extend((0..10).rev().map(|x| p(x as f64, 0.0)));

    // No headings: the 180 degree turn at index 10 splits the path
    let segments = analyze_path(&points, None, &PatrolConfig::default()).unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].start_index, 10);
}

#[test]
fn test_analyze_path_out_and_back_segment() {
    let mut points: Vec<Point3> = (0..=10).map(|x| p(x as f64, 0.0)).collect();
    points.extend((0..10).rev().map(|x| p(x as f64, 0.0)));

    // Nothing exceeds 180 degrees, so the whole path is one segment
    let config = PatrolConfig {
        rotation_threshold_deg: 180.0,
        ..PatrolConfig::default()
    };
    let segments = analyze_path(&points, None, &config).unwrap();
    assert_eq!(segments.len(), 1);
    assert!(segments[0].is_loop);
    assert!(segments[0].is_reverse);
}

#[test]
fn test_analyze_path_degenerate() {
    assert!(analyze_path(&[], None, &PatrolConfig::default())
        .unwrap()
        .is_empty());
    let one = analyze_path(&[p(1.0, 2.0)], None, &PatrolConfig::default()).unwrap();
    assert_eq!(one.len(), 1);
    assert!(!one[0].is_loop);
}

#[test]
fn test_patrol_config_validation() {
    let config = PatrolConfig {
        loop_tolerance: -1.0,
        ..PatrolConfig::default()
    };
    assert!(analyze_path(&[p(0.0, 0.0)], None, &config)
        .unwrap_err()
        .is_invalid_configuration());
}
