use super::super::domain::{Badge, EvaluationStatus};
use super::rules::{LOW_COVERAGE_THRESHOLD, PASS_COVERAGE_THRESHOLD};

/// Everything the status decision depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSignals<'a> {
    pub coverage_ratio: f64,
    pub false_count: u32,
    pub badges: &'a [Badge],
    pub confession_adopted: bool,
}

/// First matching rule wins: disqualifiers, then pass, then caution.
pub fn classify_status(signals: &StatusSignals<'_>) -> EvaluationStatus {
    let disqualified = signals.badges.iter().any(|badge| badge.is_disqualifying());

    if disqualified
        || signals.coverage_ratio < LOW_COVERAGE_THRESHOLD
        || signals.false_count > 0
    {
        return EvaluationStatus::RedFlag;
    }

    if signals.confession_adopted || signals.coverage_ratio >= PASS_COVERAGE_THRESHOLD {
        return EvaluationStatus::Pass;
    }

    if signals.coverage_ratio >= LOW_COVERAGE_THRESHOLD {
        return EvaluationStatus::Caution;
    }

    EvaluationStatus::RedFlag
}
