use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The ten non-negotiable doctrines every evaluation is scored against, in checklist order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreDoctrineKey {
    Trinity,
    Gospel,
    JustificationByFaith,
    ChristDeityHumanity,
    ScriptureAuthority,
    IncarnationVirginBirth,
    AtonementNecessarySufficient,
    ResurrectionOfJesus,
    ReturnAndJudgment,
    CharacterOfGod,
}

impl CoreDoctrineKey {
    pub const ALL: [CoreDoctrineKey; 10] = [
        CoreDoctrineKey::Trinity,
        CoreDoctrineKey::Gospel,
        CoreDoctrineKey::JustificationByFaith,
        CoreDoctrineKey::ChristDeityHumanity,
        CoreDoctrineKey::ScriptureAuthority,
        CoreDoctrineKey::IncarnationVirginBirth,
        CoreDoctrineKey::AtonementNecessarySufficient,
        CoreDoctrineKey::ResurrectionOfJesus,
        CoreDoctrineKey::ReturnAndJudgment,
        CoreDoctrineKey::CharacterOfGod,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CoreDoctrineKey::Trinity => "trinity",
            CoreDoctrineKey::Gospel => "gospel",
            CoreDoctrineKey::JustificationByFaith => "justification_by_faith",
            CoreDoctrineKey::ChristDeityHumanity => "christ_deity_humanity",
            CoreDoctrineKey::ScriptureAuthority => "scripture_authority",
            CoreDoctrineKey::IncarnationVirginBirth => "incarnation_virgin_birth",
            CoreDoctrineKey::AtonementNecessarySufficient => "atonement_necessary_sufficient",
            CoreDoctrineKey::ResurrectionOfJesus => "resurrection_of_jesus",
            CoreDoctrineKey::ReturnAndJudgment => "return_and_judgment",
            CoreDoctrineKey::CharacterOfGod => "character_of_god",
        }
    }
}

/// Tri-state answer for a single core doctrine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctrineStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl DoctrineStatus {
    /// Coerce an extractor value; anything other than the three literals is `Unknown`.
    pub fn from_raw(value: &serde_json::Value) -> Self {
        match value.as_str() {
            Some("true") => DoctrineStatus::True,
            Some("false") => DoctrineStatus::False,
            _ => DoctrineStatus::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DoctrineStatus::True => "true",
            DoctrineStatus::False => "false",
            DoctrineStatus::Unknown => "unknown",
        }
    }
}

/// Complete core-doctrine answer sheet. Always holds exactly the ten checklist keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<CoreDoctrineKey, DoctrineStatus>")]
pub struct CoreDoctrineMap(BTreeMap<CoreDoctrineKey, DoctrineStatus>);

impl CoreDoctrineMap {
    pub fn unknown() -> Self {
        Self(
            CoreDoctrineKey::ALL
                .iter()
                .map(|key| (*key, DoctrineStatus::Unknown))
                .collect(),
        )
    }

    /// Build the full map from loosely typed extractor answers.
    pub fn normalize(raw: &RawDoctrineAnswers) -> Self {
        let mut map = Self::unknown();
        for key in CoreDoctrineKey::ALL {
            if let Some(value) = raw.get(key.as_str()) {
                map.set(key, DoctrineStatus::from_raw(value));
            }
        }
        map
    }

    pub fn get(&self, key: CoreDoctrineKey) -> DoctrineStatus {
        self.0.get(&key).copied().unwrap_or_default()
    }

    pub fn set(&mut self, key: CoreDoctrineKey, status: DoctrineStatus) {
        self.0.insert(key, status);
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoreDoctrineKey, DoctrineStatus)> + '_ {
        CoreDoctrineKey::ALL.into_iter().map(|key| (key, self.get(key)))
    }

    pub fn count(&self, status: DoctrineStatus) -> usize {
        self.iter().filter(|(_, value)| *value == status).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CoreDoctrineMap {
    fn default() -> Self {
        Self::unknown()
    }
}

impl From<BTreeMap<CoreDoctrineKey, DoctrineStatus>> for CoreDoctrineMap {
    fn from(value: BTreeMap<CoreDoctrineKey, DoctrineStatus>) -> Self {
        let mut map = Self::unknown();
        for (key, status) in value {
            map.set(key, status);
        }
        map
    }
}

/// Core doctrine answers exactly as the extractor produced them.
pub type RawDoctrineAnswers = BTreeMap<String, serde_json::Value>;

/// Overall directory verdict for an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pass,
    Caution,
    RedFlag,
}

impl EvaluationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Pass => "pass",
            EvaluationStatus::Caution => "caution",
            EvaluationStatus::RedFlag => "red_flag",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "pass" => Some(EvaluationStatus::Pass),
            "caution" => Some(EvaluationStatus::Caution),
            "red_flag" => Some(EvaluationStatus::RedFlag),
            _ => None,
        }
    }
}

/// Closed set of evaluation badges the directory recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    ConfessionalSeal,
    LowEssentialsCoverage,
    WeCannotEndorse,
    LgbtqAffirming,
    ProsperityGospel,
    HyperCharismatic,
    EntertainmentDriven,
    CautiousContinuationist,
    Charismatic,
    Reformed,
    Paedocommunion,
    ExpositoryPreaching,
    RegulativePrinciple,
    HighChurchLiturgical,
    DenominationAffiliated,
    Independent,
    HouseChurch,
    MultiSite,
    SmallChurch,
    Megachurch,
}

impl Badge {
    pub const ALL: [Badge; 20] = [
        Badge::ConfessionalSeal,
        Badge::LowEssentialsCoverage,
        Badge::WeCannotEndorse,
        Badge::LgbtqAffirming,
        Badge::ProsperityGospel,
        Badge::HyperCharismatic,
        Badge::EntertainmentDriven,
        Badge::CautiousContinuationist,
        Badge::Charismatic,
        Badge::Reformed,
        Badge::Paedocommunion,
        Badge::ExpositoryPreaching,
        Badge::RegulativePrinciple,
        Badge::HighChurchLiturgical,
        Badge::DenominationAffiliated,
        Badge::Independent,
        Badge::HouseChurch,
        Badge::MultiSite,
        Badge::SmallChurch,
        Badge::Megachurch,
    ];

    /// Display label including the emoji marker used on directory cards.
    pub const fn label(self) -> &'static str {
        match self {
            Badge::ConfessionalSeal => "✅ Confessional Seal",
            Badge::LowEssentialsCoverage => "⚠️ Low Essentials Coverage",
            Badge::WeCannotEndorse => "🚫 We Cannot Endorse",
            Badge::LgbtqAffirming => "🏳️‍🌈 LGBTQ Affirming",
            Badge::ProsperityGospel => "⚠️ Prosperity Gospel",
            Badge::HyperCharismatic => "⚠️ Hyper-Charismatic",
            Badge::EntertainmentDriven => "⚠️ Entertainment-Driven",
            Badge::CautiousContinuationist => "🕊️ Cautious Continuationist",
            Badge::Charismatic => "🔥 Charismatic",
            Badge::Reformed => "📜 Reformed",
            Badge::Paedocommunion => "🍷 Paedocommunion",
            Badge::ExpositoryPreaching => "📖 Expository Preaching",
            Badge::RegulativePrinciple => "🎵 Regulative Principle of Worship",
            Badge::HighChurchLiturgical => "📿 High Church/Liturgical",
            Badge::DenominationAffiliated => "🤝 Denomination-Affiliated",
            Badge::Independent => "🆓 Independent",
            Badge::HouseChurch => "🏠 House Church",
            Badge::MultiSite => "🏢 Multi-Site",
            Badge::SmallChurch => "👥 Small Church",
            Badge::Megachurch => "🏟️ Megachurch",
        }
    }

    const fn plain_name(self) -> &'static str {
        match self {
            Badge::ConfessionalSeal => "confessional seal",
            Badge::LowEssentialsCoverage => "low essentials coverage",
            Badge::WeCannotEndorse => "we cannot endorse",
            Badge::LgbtqAffirming => "lgbtq affirming",
            Badge::ProsperityGospel => "prosperity gospel",
            Badge::HyperCharismatic => "hyper charismatic",
            Badge::EntertainmentDriven => "entertainment driven",
            Badge::CautiousContinuationist => "cautious continuationist",
            Badge::Charismatic => "charismatic",
            Badge::Reformed => "reformed",
            Badge::Paedocommunion => "paedocommunion",
            Badge::ExpositoryPreaching => "expository preaching",
            Badge::RegulativePrinciple => "regulative principle of worship",
            Badge::HighChurchLiturgical => "high church liturgical",
            Badge::DenominationAffiliated => "denomination affiliated",
            Badge::Independent => "independent",
            Badge::HouseChurch => "house church",
            Badge::MultiSite => "multi site",
            Badge::SmallChurch => "small church",
            Badge::Megachurch => "megachurch",
        }
    }

    /// Resolve an extractor label against the allow-list, ignoring emoji and punctuation.
    pub fn parse(value: &str) -> Option<Self> {
        let key = badge_key(value);
        if key.is_empty() {
            return None;
        }
        if key == "cannot endorse" {
            return Some(Badge::WeCannotEndorse);
        }
        if key == "regulative principle" {
            return Some(Badge::RegulativePrinciple);
        }
        Badge::ALL
            .into_iter()
            .find(|badge| badge.plain_name() == key)
    }

    /// Badges that disqualify a church regardless of doctrinal coverage.
    pub const fn is_disqualifying(self) -> bool {
        matches!(self, Badge::WeCannotEndorse | Badge::LgbtqAffirming)
    }
}

fn badge_key(value: &str) -> String {
    let spaced: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Structured extractor output. Stored verbatim as the historical raw record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchEvaluationRaw {
    pub church: ChurchExtraction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchExtraction {
    pub name: Option<String>,
    pub website: String,
    pub addresses: Vec<ExtractedAddress>,
    pub contacts: Contacts,
    pub service_times: Vec<String>,
    pub best_pages_for: BestPages,
    pub denomination: Denomination,
    pub confession: Confession,
    pub core_doctrines: RawDoctrineAnswers,
    pub secondary: SecondaryDoctrines,
    pub tertiary: TertiaryDoctrines,
    pub badges: Vec<String>,
    pub notes: Vec<EvidenceNote>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedAddress {
    pub street_1: Option<String>,
    pub street_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub post_code: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contacts {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Single best source URL per topic, as chosen by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPages {
    pub beliefs: Option<String>,
    pub confession: Option<String>,
    pub about: Option<String>,
    pub leadership: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Denomination {
    pub label: Option<String>,
    pub confidence: f64,
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confession {
    pub adopted: bool,
    pub name: Option<String>,
    pub source_url: Option<String>,
}

/// Denominational-distinctive positions. Informational only; never gates status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryDoctrines {
    pub baptism: Option<String>,
    pub governance: Option<String>,
    pub lords_supper: Option<String>,
    pub gifts: Option<String>,
    pub women_in_church: Option<String>,
    pub sanctification: Option<String>,
    pub continuity: Option<String>,
    pub security: Option<String>,
    pub atonement_model: Option<String>,
}

impl SecondaryDoctrines {
    pub(crate) fn fields_mut(&mut self) -> [&mut Option<String>; 9] {
        [
            &mut self.baptism,
            &mut self.governance,
            &mut self.lords_supper,
            &mut self.gifts,
            &mut self.women_in_church,
            &mut self.sanctification,
            &mut self.continuity,
            &mut self.security,
            &mut self.atonement_model,
        ]
    }

    pub(crate) fn fields(&self) -> [&Option<String>; 9] {
        [
            &self.baptism,
            &self.governance,
            &self.lords_supper,
            &self.gifts,
            &self.women_in_church,
            &self.sanctification,
            &self.continuity,
            &self.security,
            &self.atonement_model,
        ]
    }
}

/// Disputable-matter positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TertiaryDoctrines {
    pub eschatology: Option<String>,
    pub worship_style: Option<String>,
    pub counseling: Option<String>,
    pub creation: Option<String>,
    pub christian_liberty: Option<String>,
    pub discipline: Option<String>,
    pub parachurch: Option<String>,
}

/// Short quote or observation backing a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceNote {
    pub label: String,
    pub text: String,
    pub source_url: Option<String>,
}

/// Derived scoring result for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEvaluation {
    pub normalized_core: CoreDoctrineMap,
    pub badges: Vec<Badge>,
    pub coverage_ratio: f64,
    pub core_on_site_count: u32,
    pub false_count: u32,
    pub core_total_count: u32,
    pub confession_adopted: bool,
    pub status: EvaluationStatus,
    pub secondary: SecondaryDoctrines,
    pub tertiary: TertiaryDoctrines,
}
