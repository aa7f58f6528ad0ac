//! Confession-based inference for doctrinal answers the crawled pages never restate.

mod catalog;

pub use catalog::{ConfessionCatalog, ConfessionEntry};

use super::domain::{CoreDoctrineMap, DoctrineStatus, SecondaryDoctrines};

/// Values the extractor uses when a secondary position could not be determined.
const AMBIGUOUS_VALUES: [&str; 9] = [
    "ambiguous/not stated",
    "mixed/unclear",
    "not stated",
    "ambiguous",
    "unknown",
    "unclear",
    "mixed",
    "null",
    "",
];

/// Promote every `unknown` core doctrine to `true` for a confession-adopting church.
///
/// Explicit `false` answers are left alone.
pub fn apply_confession_to_core(core: &CoreDoctrineMap, confession_adopted: bool) -> CoreDoctrineMap {
    let mut resolved = core.clone();
    if !confession_adopted {
        return resolved;
    }

    for (key, status) in core.iter() {
        if status == DoctrineStatus::Unknown {
            resolved.set(key, DoctrineStatus::True);
        }
    }
    resolved
}

/// Fill null or ambiguous secondary answers from the adopted confession's canonical positions.
pub fn apply_confession_to_secondary(
    secondary: &SecondaryDoctrines,
    confession_name: Option<&str>,
    confession_adopted: bool,
    catalog: &ConfessionCatalog,
) -> SecondaryDoctrines {
    let mut resolved = secondary.clone();
    if !confession_adopted {
        return resolved;
    }
    let Some(entry) = confession_name.and_then(|name| catalog.lookup(name)) else {
        return resolved;
    };

    for (slot, canonical) in resolved.fields_mut().into_iter().zip(entry.positions.fields()) {
        if is_ambiguous(slot.as_deref()) {
            *slot = canonical.clone();
        }
    }
    resolved
}

pub(crate) fn is_ambiguous(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(text) => {
            let lowered = text.trim().to_lowercase();
            AMBIGUOUS_VALUES.contains(&lowered.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::domain::CoreDoctrineKey;
    use super::*;

    fn sample_core() -> CoreDoctrineMap {
        let mut core = CoreDoctrineMap::unknown();
        core.set(CoreDoctrineKey::Trinity, DoctrineStatus::True);
        core.set(CoreDoctrineKey::Gospel, DoctrineStatus::False);
        core
    }

    #[test]
    fn core_inference_is_noop_without_adoption() {
        let core = sample_core();
        assert_eq!(apply_confession_to_core(&core, false), core);
    }

    #[test]
    fn core_inference_fills_unknowns_but_never_flips_false() {
        let resolved = apply_confession_to_core(&sample_core(), true);

        assert_eq!(resolved.get(CoreDoctrineKey::Gospel), DoctrineStatus::False);
        assert_eq!(resolved.count(DoctrineStatus::True), 9);
        assert_eq!(resolved.count(DoctrineStatus::Unknown), 0);
    }

    #[test]
    fn core_inference_is_idempotent() {
        let once = apply_confession_to_core(&sample_core(), true);
        let twice = apply_confession_to_core(&once, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn secondary_inference_replaces_only_ambiguous_values() {
        let catalog = ConfessionCatalog::standard();
        let secondary = SecondaryDoctrines {
            baptism: Some("Believer's baptism".to_string()),
            governance: Some("  Ambiguous/Not Stated ".to_string()),
            lords_supper: Some("MIXED".to_string()),
            gifts: None,
            ..SecondaryDoctrines::default()
        };

        let resolved = apply_confession_to_secondary(
            &secondary,
            Some("Westminster Confession of Faith"),
            true,
            &catalog,
        );

        assert_eq!(resolved.baptism.as_deref(), Some("Believer's baptism"));
        assert_eq!(resolved.governance.as_deref(), Some("presbyterian"));
        assert_eq!(resolved.lords_supper.as_deref(), Some("spiritual presence"));
        assert_eq!(resolved.gifts.as_deref(), Some("cessationist"));
        assert_eq!(resolved.atonement_model.as_deref(), Some("penal substitution"));

        let again = apply_confession_to_secondary(
            &resolved,
            Some("Westminster Confession of Faith"),
            true,
            &catalog,
        );
        assert_eq!(again, resolved);
    }

    #[test]
    fn secondary_inference_skips_unrecognized_or_unadopted_confessions() {
        let catalog = ConfessionCatalog::standard();
        let secondary = SecondaryDoctrines::default();

        assert_eq!(
            apply_confession_to_secondary(&secondary, Some("Our Own Statement"), true, &catalog),
            secondary
        );
        assert_eq!(
            apply_confession_to_secondary(&secondary, Some("1689 LBCF"), false, &catalog),
            secondary
        );
        assert_eq!(
            apply_confession_to_secondary(&secondary, None, true, &catalog),
            secondary
        );
    }

    #[test]
    fn catalog_lookup_tolerates_punctuation_and_aliases() {
        let catalog = ConfessionCatalog::standard();

        let exact = catalog
            .lookup("second london baptist confession 1689")
            .expect("exact match");
        assert_eq!(exact.name, "Second London Baptist Confession (1689)");

        let alias = catalog.lookup("Heidelberg Catechism").expect("alias match");
        assert_eq!(alias.name, "Three Forms of Unity");

        let first_london = catalog.lookup("1644 LBCF").expect("alias match");
        assert_eq!(first_london.name, "First London Baptist Confession (1644)");

        assert!(catalog.lookup("   ").is_none());
        assert_eq!(catalog.entries().len(), 8);
    }
}
