//! End-to-end tests on generated patrol traces
//!
//! Run with: `cargo test --features synthetic`

#![cfg(feature = "synthetic")]

use patroltrace::synthetic::{PatrolPattern, SyntheticScenario};
use patroltrace::{
    AnalysisConfig, ClusterConfig, CycleConfig, PatrolConfig, SimplifyConfig, analyze_path,
    analyze_trace, cluster, extract_cycle_greedy,
};

#[test]
fn test_lingering_spots_cluster() {
    let trace = SyntheticScenario::lingering().generate();
    let result = cluster(&trace.positions(), &ClusterConfig::new(1.0, 5)).unwrap();

    assert_eq!(result.clusters.len(), 3);
    assert!(result.noise.is_empty());
    for (id, c) in result.clusters.iter().enumerate() {
        assert_eq!(c.len(), 20);
        assert_eq!(c.indices[0], id * 20);
    }
}

#[test]
fn test_two_lap_patrol_extracts_one_lap() {
    let scenario = SyntheticScenario {
        pattern: PatrolPattern::SquareLoop {
            side: 5.0,
            points_per_side: 5,
            laps: 2,
        },
        ..SyntheticScenario::square_patrol()
    };
    let trace = scenario.generate();
    let positions = trace.positions();
    let headings = trace.headings().unwrap();

    let cycle = extract_cycle_greedy(&positions, Some(&headings), &CycleConfig::default()).unwrap();
    assert_eq!(cycle.len(), 21);
    assert_eq!(cycle.first(), cycle.last());
}

#[test]
fn test_ping_pong_segments_on_headings() {
    let trace = SyntheticScenario::ping_pong_patrol().generate();
    let headings = trace.headings().unwrap();

    let segments =
        analyze_path(&trace.positions(), Some(&headings), &PatrolConfig::default()).unwrap();
    // Out and back
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].start_index, 0);
    let covered: usize = segments.iter().map(|s| s.raw_len).sum();
    assert_eq!(covered, trace.len());
}

#[test]
fn test_ping_pong_angled_simplification_is_reverse() {
    let trace = SyntheticScenario::ping_pong_patrol().generate();
    let config = AnalysisConfig {
        simplify: SimplifyConfig {
            preserve_sharp_turns: true,
            ..SimplifyConfig::default()
        },
        ..AnalysisConfig::default()
    };

    let analysis = analyze_trace(&trace, &config).unwrap();
    assert!(analysis.simplified.is_loop);
    assert!(analysis.simplified.is_reverse);
}

#[test]
fn test_noisy_loop_pipeline() {
    let trace = SyntheticScenario::long_noisy_loop(3).generate();
    let config = AnalysisConfig {
        simplify: SimplifyConfig {
            epsilon: 1.0,
            ..SimplifyConfig::default()
        },
        ..AnalysisConfig::default()
    };

    let analysis = analyze_trace(&trace, &config).unwrap();
    assert_eq!(analysis.summary.point_count, trace.len());
    assert!(analysis.simplified.len() < trace.len() / 10);
    assert!(analysis.simplified.is_loop);
    assert_eq!(analysis.clusters.point_count(), trace.len());
}
