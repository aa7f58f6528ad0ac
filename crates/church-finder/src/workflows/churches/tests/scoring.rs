use super::common::*;
use crate::workflows::churches::domain::{Badge, CoreDoctrineKey, DoctrineStatus, EvaluationStatus};
use crate::workflows::churches::scoring::{classify_status, EvaluationEngine, StatusSignals};
use serde_json::json;

fn engine() -> EvaluationEngine {
    EvaluationEngine::default()
}

#[test]
fn six_true_four_unknown_is_caution_without_derived_badges() {
    let processed = engine().process(&raw_evaluation(6, 0));

    assert_eq!(processed.coverage_ratio, 0.6);
    assert_eq!(processed.core_on_site_count, 6);
    assert_eq!(processed.core_total_count, 10);
    assert_eq!(processed.status, EvaluationStatus::Caution);
    assert!(!processed.badges.contains(&Badge::WeCannotEndorse));
    assert!(!processed.badges.contains(&Badge::LowEssentialsCoverage));
}

#[test]
fn a_single_denial_is_disqualifying() {
    let processed = engine().process(&raw_evaluation(6, 1));

    assert_eq!(processed.false_count, 1);
    assert_eq!(processed.status, EvaluationStatus::RedFlag);
    assert!(processed.badges.contains(&Badge::WeCannotEndorse));

    let strong = engine().process(&raw_evaluation(9, 1));
    assert_eq!(strong.coverage_ratio, 0.9);
    assert_eq!(strong.status, EvaluationStatus::RedFlag);
}

#[test]
fn adopted_confession_resolves_unknowns_and_passes() {
    let processed = engine().process(&confessional_raw());

    assert_eq!(processed.coverage_ratio, 1.0);
    assert_eq!(processed.status, EvaluationStatus::Pass);
    assert!(processed.confession_adopted);
    assert!(processed.badges.contains(&Badge::ConfessionalSeal));
    assert!(!processed.badges.contains(&Badge::LowEssentialsCoverage));
    assert!(processed
        .normalized_core
        .iter()
        .all(|(_, status)| status == DoctrineStatus::True));
}

#[test]
fn adopted_confession_keeps_explicit_denials() {
    let mut raw = confessional_raw();
    raw.church
        .core_doctrines
        .insert(CoreDoctrineKey::Trinity.as_str().to_string(), json!("false"));

    let processed = engine().process(&raw);

    assert_eq!(
        processed.normalized_core.get(CoreDoctrineKey::Trinity),
        DoctrineStatus::False
    );
    assert_eq!(processed.coverage_ratio, 0.9);
    assert_eq!(processed.status, EvaluationStatus::RedFlag);
    assert!(processed.badges.contains(&Badge::WeCannotEndorse));
    assert!(processed.badges.contains(&Badge::ConfessionalSeal));
}

#[test]
fn coverage_ratio_is_exact_at_the_pass_threshold() {
    let processed = engine().process(&raw_evaluation(7, 0));

    assert_eq!(processed.coverage_ratio, 0.7);
    assert_eq!(processed.status, EvaluationStatus::Pass);
}

#[test]
fn low_coverage_adds_badge_once_and_flags_red() {
    let mut raw = raw_evaluation(4, 0);
    raw.church.badges = vec!["⚠️ Low Essentials Coverage".to_string()];

    let processed = engine().process(&raw);

    assert_eq!(processed.status, EvaluationStatus::RedFlag);
    let low = processed
        .badges
        .iter()
        .filter(|badge| **badge == Badge::LowEssentialsCoverage)
        .count();
    assert_eq!(low, 1);
}

#[test]
fn affirming_stance_badge_is_red_flag_despite_full_coverage() {
    let mut raw = raw_evaluation(10, 0);
    raw.church.badges = vec!["🏳️‍🌈 LGBTQ Affirming".to_string()];

    let processed = engine().process(&raw);

    assert_eq!(processed.coverage_ratio, 1.0);
    assert_eq!(processed.status, EvaluationStatus::RedFlag);
}

#[test]
fn missing_and_malformed_core_answers_count_as_unknown() {
    let mut raw = raw_evaluation(0, 0);
    raw.church.core_doctrines.clear();
    raw.church
        .core_doctrines
        .insert(CoreDoctrineKey::Gospel.as_str().to_string(), json!(true));
    raw.church
        .core_doctrines
        .insert("not_a_doctrine".to_string(), json!("true"));

    let processed = engine().process(&raw);

    assert_eq!(processed.normalized_core.len(), 10);
    assert_eq!(processed.core_on_site_count, 0);
    assert_eq!(processed.status, EvaluationStatus::RedFlag);
}

#[test]
fn unrecognized_badges_are_dropped_and_order_is_preserved() {
    let mut raw = raw_evaluation(8, 0);
    raw.church.badges = vec![
        "📖 Expository Preaching".to_string(),
        "Great Coffee".to_string(),
        "📜 Reformed".to_string(),
        "Expository Preaching".to_string(),
    ];

    let processed = engine().process(&raw);

    assert_eq!(
        processed.badges,
        vec![Badge::ExpositoryPreaching, Badge::Reformed]
    );
}

#[test]
fn processing_is_idempotent() {
    let raw = confessional_raw();
    let first = engine().process(&raw);
    let second = engine().process(&raw);

    assert_eq!(first, second);
}

#[test]
fn secondary_positions_are_filled_from_the_adopted_confession() {
    let mut raw = confessional_raw();
    raw.church.secondary.governance = Some("Ambiguous/Not stated".to_string());

    let processed = engine().process(&raw);

    assert_eq!(processed.secondary.baptism.as_deref(), Some("believer"));
    assert_eq!(
        processed.secondary.governance.as_deref(),
        Some("presbyterian")
    );
}

#[test]
fn status_is_a_pure_function_of_its_signals() {
    let badges = [Badge::Reformed];
    let signals = StatusSignals {
        coverage_ratio: 0.6,
        false_count: 0,
        badges: &badges,
        confession_adopted: false,
    };

    assert_eq!(classify_status(&signals), EvaluationStatus::Caution);
    assert_eq!(classify_status(&signals), classify_status(&signals));

    let confessional = StatusSignals {
        confession_adopted: true,
        ..signals
    };
    assert_eq!(classify_status(&confessional), EvaluationStatus::Pass);

    let endorsed_against = [Badge::WeCannotEndorse];
    let disqualified = StatusSignals {
        badges: &endorsed_against,
        confession_adopted: true,
        coverage_ratio: 1.0,
        ..signals
    };
    assert_eq!(classify_status(&disqualified), EvaluationStatus::RedFlag);
}
