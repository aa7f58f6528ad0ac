mod policy;
mod rules;

pub use policy::{classify_status, StatusSignals};

use std::sync::Arc;

use super::confession::{apply_confession_to_core, apply_confession_to_secondary, ConfessionCatalog};
use super::domain::{ChurchEvaluationRaw, CoreDoctrineMap, ProcessedEvaluation};

/// Stateless post-processor turning extractor output into a scored evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    catalog: Arc<ConfessionCatalog>,
}

impl EvaluationEngine {
    pub fn new(catalog: Arc<ConfessionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ConfessionCatalog {
        &self.catalog
    }

    pub fn process(&self, raw: &ChurchEvaluationRaw) -> ProcessedEvaluation {
        let church = &raw.church;
        let confession_adopted = church.confession.adopted;

        let normalized = CoreDoctrineMap::normalize(&church.core_doctrines);
        let normalized_core = apply_confession_to_core(&normalized, confession_adopted);

        let tally = rules::tally_core(&normalized_core);
        let badges = rules::assign_badges(&church.badges, confession_adopted, &tally);

        let status = classify_status(&StatusSignals {
            coverage_ratio: tally.coverage_ratio,
            false_count: tally.false_count,
            badges: &badges,
            confession_adopted,
        });

        let secondary = apply_confession_to_secondary(
            &church.secondary,
            church.confession.name.as_deref(),
            confession_adopted,
            &self.catalog,
        );

        ProcessedEvaluation {
            normalized_core,
            badges,
            coverage_ratio: tally.coverage_ratio,
            core_on_site_count: tally.true_count,
            false_count: tally.false_count,
            core_total_count: tally.total,
            confession_adopted,
            status,
            secondary,
            tertiary: church.tertiary.clone(),
        }
    }
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::new(Arc::new(ConfessionCatalog::standard()))
    }
}
