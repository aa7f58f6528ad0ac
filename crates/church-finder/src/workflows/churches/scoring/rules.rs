use super::super::domain::{Badge, CoreDoctrineKey, CoreDoctrineMap, DoctrineStatus};
use tracing::warn;

/// Coverage threshold below which a non-confessional church is flagged.
pub(crate) const LOW_COVERAGE_THRESHOLD: f64 = 0.5;
/// Coverage at which a church passes without a confession.
pub(crate) const PASS_COVERAGE_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CoreTally {
    pub true_count: u32,
    pub false_count: u32,
    pub total: u32,
    pub coverage_ratio: f64,
}

pub(crate) fn tally_core(core: &CoreDoctrineMap) -> CoreTally {
    let total = CoreDoctrineKey::ALL.len() as u32;
    let true_count = core.count(DoctrineStatus::True) as u32;
    let false_count = core.count(DoctrineStatus::False) as u32;
    let coverage_ratio = if total == 0 {
        0.0
    } else {
        f64::from(true_count) / f64::from(total)
    };

    CoreTally {
        true_count,
        false_count,
        total,
        coverage_ratio,
    }
}

/// Resolve extractor labels to the closed badge set, then add the derived badges.
pub(crate) fn assign_badges(
    labels: &[String],
    confession_adopted: bool,
    tally: &CoreTally,
) -> Vec<Badge> {
    let mut badges = Vec::new();
    for label in labels {
        match Badge::parse(label) {
            Some(badge) => push_unique(&mut badges, badge),
            None => warn!(label = %label, "dropping unrecognized badge label"),
        }
    }

    if confession_adopted {
        push_unique(&mut badges, Badge::ConfessionalSeal);
    }

    if !confession_adopted && tally.coverage_ratio < LOW_COVERAGE_THRESHOLD {
        push_unique(&mut badges, Badge::LowEssentialsCoverage);
    }

    if tally.false_count > 0 {
        push_unique(&mut badges, Badge::WeCannotEndorse);
    }

    badges
}

fn push_unique(badges: &mut Vec<Badge>, badge: Badge) {
    if !badges.contains(&badge) {
        badges.push(badge);
    }
}
