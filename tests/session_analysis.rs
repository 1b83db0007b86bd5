//! End-to-end tests over the public API

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use stroke_flux::types::{PauseType, Point, SessionInput, Stroke, StrokeClass, Tool};
use stroke_flux::{
    analyze_session, annotate_session, parse_session, session_to_csv, validate_session,
    AnalysisConfig, AnalysisError, SessionAnalyzer, TimeNormalizer,
};

fn point(x: f64, y: f64, pressure: f64, velocity: Option<f64>, timestamp: f64) -> Point {
    Point {
        x,
        y,
        pressure,
        tilt_x: 0.0,
        tilt_y: 0.0,
        velocity,
        timestamp,
    }
}

fn stroke(id: &str, points: Vec<Point>) -> Stroke {
    Stroke {
        id: id.to_string(),
        tool: Tool::Pencil,
        color: "#202020".to_string(),
        width: 2.0,
        layer_id: "sketch".to_string(),
        semantic_label: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        points,
    }
}

/// Horizontal line from `x0` to `x0 + length` drawn between `start` and `end`
fn line(id: &str, x0: f64, y: f64, length: f64, start: f64, end: f64, velocity: f64) -> Stroke {
    let steps = 10;
    let points = (0..=steps)
        .map(|i| {
            let f = i as f64 / steps as f64;
            point(x0 + length * f, y, 0.5, Some(velocity), start + (end - start) * f)
        })
        .collect();
    stroke(id, points)
}

fn session(strokes: Vec<Stroke>) -> SessionInput {
    SessionInput {
        session_id: "integration".to_string(),
        artist_profile_id: Some("artist-1".to_string()),
        strokes,
    }
}

#[test]
fn long_fast_straight_stroke_is_a_gesture() {
    let input = session(vec![line("sweep", 0.0, 100.0, 150.0, 0.0, 2000.0, 180.0)]);
    let features = analyze_session(&input, &AnalysisConfig::default()).unwrap();

    let classification = features.strokes[0].classification;
    assert_eq!(classification.class, StrokeClass::Gesture);
    assert_eq!(classification.confidence, 0.9);
    assert_eq!(features.stroke_classes.gesture, 1);
    assert_eq!(features.session_duration_ms, 2000.0);
}

#[test]
fn short_overlapping_follow_up_is_corrective() {
    let first = stroke(
        "outline",
        vec![
            point(0.0, 0.0, 0.5, Some(40.0), 0.0),
            point(100.0, 50.0, 0.5, Some(40.0), 200.0),
            point(200.0, 100.0, 0.5, Some(40.0), 400.0),
        ],
    );
    // drawn 100ms after the outline ended, inside its bounding box
    let fix = stroke(
        "fix",
        vec![
            point(40.0, 40.0, 0.5, Some(10.0), 500.0),
            point(60.0, 50.0, 0.5, Some(10.0), 520.0),
            point(62.0, 52.0, 0.5, Some(10.0), 540.0),
        ],
    );

    let features = analyze_session(&session(vec![first, fix]), &AnalysisConfig::default()).unwrap();

    assert_eq!(features.strokes[1].classification.class, StrokeClass::Corrective);
    assert_eq!(features.strokes[1].classification.confidence, 0.85);
    assert_eq!(features.stroke_classes.corrective, 1);
}

#[test]
fn pauses_are_bucketed_by_gap() {
    let strokes = vec![
        line("a", 0.0, 0.0, 20.0, 0.0, 100.0, 10.0),
        line("b", 0.0, 50.0, 20.0, 130.0, 200.0, 10.0),
        line("c", 0.0, 100.0, 20.0, 500.0, 600.0, 10.0),
        line("d", 0.0, 150.0, 20.0, 1500.0, 1600.0, 10.0),
    ];
    let features = analyze_session(&session(strokes), &AnalysisConfig::default()).unwrap();

    let kinds: Vec<PauseType> = features.pauses.iter().map(|p| p.pause_type).collect();
    assert_eq!(
        kinds,
        vec![PauseType::Micro, PauseType::Thinking, PauseType::Deliberate]
    );
    assert_eq!(features.rhythm.micro_pauses, 1);
    assert_eq!(features.rhythm.thinking_pauses, 1);
    assert_eq!(features.rhythm.deliberate_pauses, 1);
    assert!(features.rhythm.burstiness > 0.0);
    assert!((features.rhythm.strokes_per_minute - 4.0 / 1600.0 * 60_000.0).abs() < 1e-9);
}

#[test]
fn empty_session_yields_zero_record() {
    let features = analyze_session(&session(Vec::new()), &AnalysisConfig::default()).unwrap();

    assert_eq!(features.session_id, "integration");
    assert_eq!(features.total_strokes, 0);
    assert_eq!(features.total_points, 0);
    assert_eq!(features.session_duration_ms, 0.0);
    assert_eq!(features.rhythm.strokes_per_minute, 0.0);
    assert!(features.pauses.is_empty());
}

#[test]
fn empty_stroke_is_the_only_hard_failure() {
    let input = session(vec![stroke("blank", Vec::new())]);
    let err = analyze_session(&input, &AnalysisConfig::default()).unwrap_err();

    match err {
        AnalysisError::EmptyStroke { stroke_id } => assert_eq!(stroke_id, "blank"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!validate_session(&input).is_valid());
}

#[test]
fn normalization_round_trips() {
    let original = stroke(
        "wiggle",
        vec![
            point(0.0, 0.0, 0.1, Some(3.0), 1000.0),
            point(5.0, 7.0, 0.4, None, 1012.5),
            point(9.0, 2.0, 0.9, Some(6.0), 1040.0),
        ],
    );
    let normalized = TimeNormalizer::normalize(&original).unwrap();

    let times: Vec<f64> = normalized.points.iter().map(|p| p.normalized_time).collect();
    assert_eq!(times.first(), Some(&0.0));
    assert_eq!(times.last(), Some(&1.0));
    assert!(times.windows(2).all(|w| w[0] <= w[1]));

    assert_eq!(TimeNormalizer::denormalize(&normalized), original);
}

#[test]
fn degenerate_session_stays_finite() {
    let strokes = vec![
        stroke("tap", vec![point(10.0, 10.0, 0.5, None, 300.0)]),
        stroke(
            "still",
            vec![
                point(10.0, 10.0, 0.0, Some(0.0), 300.0),
                point(10.0, 10.0, 0.0, Some(0.0), 300.0),
                point(10.0, 10.0, 0.0, Some(0.0), 300.0),
            ],
        ),
    ];
    let features = analyze_session(&session(strokes), &AnalysisConfig::default()).unwrap();
    let json = serde_json::to_value(&features).unwrap();

    fn all_finite(value: &serde_json::Value) -> bool {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(true, f64::is_finite),
            serde_json::Value::Array(items) => items.iter().all(all_finite),
            serde_json::Value::Object(map) => map.values().all(all_finite),
            _ => !value.is_null(),
        }
    }
    assert!(all_finite(&json));
    assert_eq!(features.momentum.entropy, 0.0);
}

#[test]
fn entropy_stays_within_bounds() {
    let points = (0..40)
        .map(|i| {
            let i = i as f64;
            point(i * 3.0, (i * 0.7).sin() * 20.0, 0.3 + (i % 5.0) * 0.1, Some(i * 7.0), i * 16.0)
        })
        .collect();
    let features =
        analyze_session(&session(vec![stroke("spread", points)]), &AnalysisConfig::default())
            .unwrap();

    let entropy = features.momentum.entropy;
    assert!(entropy > 0.0);
    assert!(entropy <= 10f64.log2() + 1e-12);
}

#[test]
fn annotations_line_up_with_points() {
    let input = session(vec![
        line("a", 0.0, 0.0, 150.0, 0.0, 500.0, 200.0),
        line("b", 0.0, 80.0, 30.0, 900.0, 1000.0, 60.0),
    ]);
    let annotated = annotate_session(&input, &AnalysisConfig::default()).unwrap();

    assert_eq!(annotated.len(), 2);
    for (stroke, original) in annotated.iter().zip(&input.strokes) {
        assert_eq!(stroke.points.len(), original.points.len());
        assert_eq!(stroke.original_start_time, original.points[0].timestamp);
    }
    assert_eq!(annotated[0].class, StrokeClass::Gesture);
    assert!((annotated[1].points[3].momentum - 30.0).abs() < 1e-12);
}

#[test]
fn csv_and_report_exports() {
    let json = serde_json::to_string(&session(vec![
        line("a", 0.0, 0.0, 150.0, 0.0, 500.0, 200.0),
        line("b", 0.0, 80.0, 30.0, 900.0, 1000.0, 60.0),
    ]))
    .unwrap();

    let csv = session_to_csv(&json, &AnalysisConfig::default()).unwrap();
    let row = csv.lines().nth(1).unwrap();
    let fields: Vec<&str> = row.split(',').collect();
    assert_eq!(fields.len(), 12);
    assert_eq!(&fields[..6], &["integration", "artist-1", "1000", "2", "1", "1"]);

    let analyzer = SessionAnalyzer::new();
    let report: serde_json::Value =
        serde_json::from_str(&analyzer.to_report(&json).unwrap()).unwrap();
    assert_eq!(report["producer"]["name"], "stroke-flux");
    assert_eq!(report["producer"]["instance_id"], analyzer.encoder().instance_id());
    assert_eq!(report["features"]["total_strokes"], 2);
    assert!(report["computed_at_utc"].as_str().is_some());
}

#[test]
fn unsorted_sessions_are_flagged_but_analyzed() {
    let json = serde_json::to_string(&session(vec![
        line("late", 0.0, 0.0, 20.0, 800.0, 900.0, 10.0),
        line("early", 0.0, 50.0, 20.0, 0.0, 100.0, 10.0),
    ]))
    .unwrap();
    let input = parse_session(&json).unwrap();

    let report = validate_session(&input);
    assert!(report.is_valid());
    assert_eq!(report.issues.len(), 1);

    let features = analyze_session(&input, &AnalysisConfig::default()).unwrap();
    assert_eq!(features.total_strokes, 2);
    assert_eq!(features.session_duration_ms, 900.0);
}
