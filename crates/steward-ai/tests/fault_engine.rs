use std::path::PathBuf;

use steward_ai::precedents::{
    estimate_fault, BlendMode, ConfidenceTier, EstimationMethod, EstimatorConfig, FaultEstimator,
    IncidentCorpus, IncidentKind, IncidentQuery, IncidentRecord, PrecedentWeights, DEFAULT_TOP_K,
};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_corpus() -> IncidentCorpus {
    IncidentCorpus::from_path(fixture_path("precedents.csv")).expect("fixture corpus loads")
}

fn record(title: &str, fault: Option<f32>) -> IncidentRecord {
    IncidentRecord::new(title, "", "", fault).expect("usable record")
}

#[test]
fn fixture_corpus_skips_unusable_rows() {
    let corpus = fixture_corpus();

    assert_eq!(corpus.len(), 10);
    assert_eq!(corpus.skipped_rows(), 1);

    let blue_flag = corpus
        .records()
        .iter()
        .find(|record| record.title.starts_with("Blue flag"))
        .expect("blue flag row kept");
    assert_eq!(blue_flag.fault_pct_driver_a, None);

    let lunge = corpus
        .records()
        .iter()
        .find(|record| record.title.starts_with("Late lunge"))
        .expect("lunge row kept");
    assert_eq!(lunge.fault_pct_driver_a, Some(80.0));
}

#[test]
fn missing_dataset_degrades_to_empty_corpus() {
    let corpus = IncidentCorpus::load_or_empty(fixture_path("does-not-exist.csv"));
    assert!(corpus.is_empty());

    let assessment = estimate_fault(
        &IncidentQuery::new().with_text("divebomb"),
        corpus.records(),
        BlendMode::Precedent,
    );
    assert!(assessment.matches.is_empty());
    assert_eq!(assessment.estimate.fault_a, 60);
}

#[test]
fn lone_precedent_pulls_the_split_towards_car_a() {
    let records = vec![record("divebomb at turn 1", Some(90.0))];
    let query = IncidentQuery::new()
        .with_text("divebomb turn one")
        .with_kind(IncidentKind::Divebomb);

    let precedent = estimate_fault(&query, &records, BlendMode::Precedent);
    assert_eq!(precedent.matches.len(), 1);
    assert!(precedent.matches[0].score > 0);
    // 90 * 0.7 + 50 * 0.3
    assert_eq!(precedent.estimate.fault_a, 78);
    assert_eq!(precedent.estimate.confidence, ConfidenceTier::Medium);

    let blended = estimate_fault(&query, &records, BlendMode::RuleBlend);
    assert_eq!(blended.matches.len(), 1);
    // 90 * 0.4 + 85 * 0.4 + 80 * 0.2
    assert_eq!(blended.estimate.fault_a, 86);
    assert!(blended.estimate.fault_a > 60);
    assert_eq!(blended.estimate.rule.map(|rule| rule.id), Some("2.1"));
    assert_eq!(blended.estimate.confidence, ConfidenceTier::Medium);
}

#[test]
fn rule_hit_needs_three_matches_for_high_confidence() {
    let query = IncidentQuery::new()
        .with_text("divebomb turn one")
        .with_kind(IncidentKind::Divebomb);
    let records = vec![
        record("divebomb at turn 1", Some(90.0)),
        record("divebomb at the hairpin", Some(80.0)),
        record("divebomb into the chicane", Some(85.0)),
        record("clean pass on the straight", Some(10.0)),
    ];

    let two = estimate_fault(&query, &records[..2], BlendMode::RuleBlend);
    assert_eq!(two.matches.len(), 2);
    assert!(two.estimate.rule.is_some());
    assert_eq!(two.estimate.confidence, ConfidenceTier::Medium);

    let three = estimate_fault(&query, &records, BlendMode::RuleBlend);
    assert_eq!(three.matches.len(), 3);
    assert_eq!(three.estimate.confidence, ConfidenceTier::High);
}

#[test]
fn empty_corpus_falls_back_to_default_fault() {
    let query = IncidentQuery::new().with_kind(IncidentKind::Netcode);

    let assessment = estimate_fault(&query, &[], BlendMode::Precedent);

    assert!(assessment.matches.is_empty());
    assert_eq!(assessment.estimate.fault_a, 60);
    assert_eq!(assessment.estimate.fault_b, 40);
    assert_eq!(assessment.estimate.confidence, ConfidenceTier::Low);
}

#[test]
fn empty_corpus_in_rule_mode_still_consults_the_rulebook() {
    let query = IncidentQuery::new().with_kind(IncidentKind::Netcode);

    let assessment = estimate_fault(&query, &[], BlendMode::RuleBlend);

    assert!(assessment.matches.is_empty());
    // 60 * 0.4 + 50 * 0.4 + 50 * 0.2; the netcode rule fires on the key alone
    assert_eq!(assessment.estimate.rule.map(|rule| rule.id), Some("5.1"));
    assert_eq!(assessment.estimate.fault_a, 54);
    assert_eq!(assessment.estimate.fault_b, 46);
    assert_eq!(assessment.estimate.confidence, ConfidenceTier::Medium);
}

#[test]
fn configured_baseline_and_weights_drive_precedent_mode() {
    let records = vec![
        record("punt into turn 3", Some(80.0)),
        record("punt at the hairpin", Some(60.0)),
    ];
    let config = EstimatorConfig {
        mode: BlendMode::Precedent,
        precedent: PrecedentWeights {
            dataset: 0.6,
            baseline: 0.4,
            baseline_fault: 70.0,
        },
        ..EstimatorConfig::default()
    };

    let assessment =
        FaultEstimator::new(config).assess(&IncidentQuery::new().with_text("punt"), &records);

    assert_eq!(assessment.matches.len(), 2);
    assert_eq!(assessment.estimate.fault_a, 70);

    let default_weights = estimate_fault(
        &IncidentQuery::new().with_text("punt"),
        &records,
        BlendMode::Precedent,
    );
    // 70 * 0.7 + 50 * 0.3
    assert_eq!(default_weights.estimate.fault_a, 64);
}

#[test]
fn manual_override_ignores_the_corpus() {
    let corpus = fixture_corpus();
    let query = IncidentQuery::new()
        .with_text("divebomb late lunge car braked")
        .with_kind(IncidentKind::Divebomb)
        .with_override(15.0);

    for mode in [BlendMode::Precedent, BlendMode::RuleBlend] {
        let assessment = estimate_fault(&query, corpus.records(), mode);
        assert_eq!(assessment.estimate.fault_a, 15);
        assert_eq!(assessment.estimate.fault_b, 85);
        assert_eq!(assessment.estimate.confidence, ConfidenceTier::HumanOverride);
        assert_eq!(assessment.estimate.method, EstimationMethod::HumanOverride);
        assert!(assessment.matches.is_empty());
    }
}

#[test]
fn manual_override_is_rounded_not_clamped_to_band() {
    for (input, expected) in [(0.0, 0), (0.5, 1), (42.4, 42), (99.6, 100), (100.0, 100)] {
        let query = IncidentQuery::new().with_override(input);
        let assessment = estimate_fault(&query, &[], BlendMode::RuleBlend);
        assert_eq!(assessment.estimate.fault_a, expected, "override {input}");
        assert_eq!(assessment.estimate.fault_b, 100 - expected);
    }
}

#[test]
fn empty_query_has_no_matches_and_low_confidence() {
    let corpus = fixture_corpus();

    for mode in [BlendMode::Precedent, BlendMode::RuleBlend] {
        for text in ["", "   ", "a of to"] {
            let query = IncidentQuery::new().with_text(text);
            let assessment = estimate_fault(&query, corpus.records(), mode);
            assert!(assessment.matches.is_empty(), "{mode:?} '{text}'");
            assert_eq!(assessment.estimate.confidence, ConfidenceTier::Low);
        }
    }
}

#[test]
fn matches_are_truncated_to_top_k_in_corpus_order_on_ties() {
    let corpus = fixture_corpus();
    let query = IncidentQuery::new().with_text("car");

    let assessment = estimate_fault(&query, corpus.records(), BlendMode::Precedent);

    assert_eq!(assessment.matches.len(), DEFAULT_TOP_K);
    let titles: Vec<&str> = assessment
        .matches
        .iter()
        .map(|result| result.record.title.as_str())
        .collect();
    let expected: Vec<&str> = corpus
        .records()
        .iter()
        .take(DEFAULT_TOP_K)
        .map(|record| record.title.as_str())
        .collect();
    assert_eq!(titles, expected);
    assert_eq!(assessment.estimate.confidence, ConfidenceTier::VeryHigh);
}

#[test]
fn estimates_stay_in_band_and_sum_to_one_hundred() {
    let corpus = fixture_corpus();
    let texts = [
        "divebomb into turn one",
        "unsafe rejoin after a spin",
        "brake check on the straight",
        "netcode teleport lag",
        "two moves to defend, weave block",
        "intentional revenge wreck",
        "clean pass",
        "car",
        "",
    ];
    let kinds = IncidentKind::ordered()
        .into_iter()
        .map(Some)
        .chain(std::iter::once(None));

    for kind in kinds {
        for text in texts {
            let mut query = IncidentQuery::new().with_text(text);
            query.incident_key = kind;

            for mode in [BlendMode::Precedent, BlendMode::RuleBlend] {
                let estimator = FaultEstimator::new(EstimatorConfig::with_mode(mode));
                let first = estimator.assess(&query, corpus.records());
                let second = estimator.assess(&query, corpus.records());

                let estimate = &first.estimate;
                assert_eq!(u16::from(estimate.fault_a) + u16::from(estimate.fault_b), 100);
                assert!(
                    (5..=98).contains(&estimate.fault_a),
                    "{mode:?} {kind:?} '{text}' gave {}",
                    estimate.fault_a
                );
                assert!(first.matches.len() <= DEFAULT_TOP_K);
                assert!(first
                    .matches
                    .windows(2)
                    .all(|pair| pair[0].score >= pair[1].score));
                assert_eq!(first, second);
            }
        }
    }
}
