use super::super::domain::SecondaryDoctrines;

/// Canonical secondary positions taught by one historic confession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub positions: SecondaryDoctrines,
}

/// Read-only lookup table from confession name to its canonical secondary answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfessionCatalog {
    entries: Vec<ConfessionEntry>,
}

impl ConfessionCatalog {
    pub fn new(entries: Vec<ConfessionEntry>) -> Self {
        Self { entries }
    }

    /// The historic confessions accepted by the extraction prompt.
    pub fn standard() -> Self {
        Self::new(vec![
            ConfessionEntry {
                name: "Westminster Confession of Faith (1646/47)",
                aliases: &["westminster"],
                positions: positions([
                    "infant (paedo)",
                    "presbyterian",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "Second London Baptist Confession (1689)",
                aliases: &["1689", "second london"],
                positions: positions([
                    "believer's by immersion",
                    "elder-led congregational",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology (1689 federalism)",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "First London Baptist Confession (1644)",
                aliases: &["1644", "first london"],
                positions: positions([
                    "believer's by immersion",
                    "congregational",
                    "memorial",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "Three Forms of Unity",
                aliases: &["belgic", "heidelberg", "dort"],
                positions: positions([
                    "infant (paedo)",
                    "presbyterian (consistory)",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "Second Helvetic Confession (1566)",
                aliases: &["helvetic"],
                positions: positions([
                    "infant (paedo)",
                    "presbyterian",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "Savoy Declaration (1658)",
                aliases: &["savoy"],
                positions: positions([
                    "infant (paedo)",
                    "congregational",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "Irish Articles (1615)",
                aliases: &["irish articles"],
                positions: positions([
                    "infant (paedo)",
                    "episcopal",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
            ConfessionEntry {
                name: "Thirty-Nine Articles",
                aliases: &["thirty nine articles", "39 articles"],
                positions: positions([
                    "infant (paedo)",
                    "episcopal",
                    "spiritual presence",
                    "cessationist",
                    "complementarian",
                    "progressive",
                    "covenant theology",
                    "perseverance of the saints",
                    "penal substitution",
                ]),
            },
        ])
    }

    /// Resolve a free-text confession name. Exact names win over alias matches.
    pub fn lookup(&self, name: &str) -> Option<&ConfessionEntry> {
        let key = normalize_name(name);
        if key.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|entry| normalize_name(entry.name) == key)
            .or_else(|| {
                self.entries.iter().find(|entry| {
                    entry
                        .aliases
                        .iter()
                        .any(|alias| key.contains(&normalize_name(alias)))
                })
            })
    }

    pub fn entries(&self) -> &[ConfessionEntry] {
        &self.entries
    }
}

impl Default for ConfessionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn positions(values: [&str; 9]) -> SecondaryDoctrines {
    let [baptism, governance, lords_supper, gifts, women_in_church, sanctification, continuity, security, atonement_model] =
        values.map(|value| Some(value.to_string()));
    SecondaryDoctrines {
        baptism,
        governance,
        lords_supper,
        gifts,
        women_in_church,
        sanctification,
        continuity,
        security,
        atonement_model,
    }
}

fn normalize_name(value: &str) -> String {
    let spaced: String = value
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
