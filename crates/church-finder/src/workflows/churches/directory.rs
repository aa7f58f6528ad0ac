//! Directory listing, filter metadata, and existence checks over persisted churches.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::EvaluationStatus;
use super::mapping::{ChurchDetail, ChurchListItem};
use super::repository::ChurchId;

pub const PAGE_SIZE: usize = 10;

/// Status filter applied to each church's latest evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    HistoricReformed,
    Recommended,
    Caution,
    RedFlag,
    ExcludeRedFlag,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "historic_reformed" => Some(StatusFilter::HistoricReformed),
            "recommended" => Some(StatusFilter::Recommended),
            "caution" => Some(StatusFilter::Caution),
            "red_flag" => Some(StatusFilter::RedFlag),
            "exclude_red_flag" => Some(StatusFilter::ExcludeRedFlag),
            _ => None,
        }
    }

    fn matches(self, church: &ChurchDetail) -> bool {
        let status = church.status();
        match self {
            StatusFilter::HistoricReformed => church.confession_adopted,
            StatusFilter::Recommended => status == Some(EvaluationStatus::Pass),
            StatusFilter::Caution => status == Some(EvaluationStatus::Caution),
            StatusFilter::RedFlag => status == Some(EvaluationStatus::RedFlag),
            StatusFilter::ExcludeRedFlag => status != Some(EvaluationStatus::RedFlag),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchFilter {
    pub page: Option<i64>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub denomination: Option<String>,
    pub confessional: Option<bool>,
    pub status: Option<StatusFilter>,
}

impl ChurchFilter {
    fn matches(&self, church: &ChurchDetail) -> bool {
        if let Some(state) = non_blank(&self.state) {
            let any = church
                .addresses
                .iter()
                .any(|address| eq_ignore_case(address.state.as_deref(), state));
            if !any {
                return false;
            }
        }
        if let Some(city) = non_blank(&self.city) {
            let any = church
                .addresses
                .iter()
                .any(|address| eq_ignore_case(address.city.as_deref(), city));
            if !any {
                return false;
            }
        }
        if let Some(denomination) = non_blank(&self.denomination) {
            if !eq_ignore_case(church.denomination.label.as_deref(), denomination) {
                return false;
            }
        }
        if let Some(confessional) = self.confessional {
            if church.confession_adopted != confessional {
                return false;
            }
        }
        match self.status {
            Some(status) => status.matches(church),
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchPage {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub items: Vec<ChurchListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryTotals {
    pub overall: usize,
    pub confessional: usize,
    pub non_confessional: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchMeta {
    pub states: Vec<String>,
    pub denominations: Vec<String>,
    pub totals: DirectoryTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistenceCheck {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub church_id: Option<ChurchId>,
}

/// Filter, priority-sort, and paginate churches for the directory.
pub fn list(churches: &[ChurchDetail], filter: &ChurchFilter) -> ChurchPage {
    let page = filter.page.filter(|page| *page >= 1).unwrap_or(1) as usize;

    let mut matching: Vec<&ChurchDetail> = churches
        .iter()
        .filter(|church| filter.matches(church))
        .collect();
    matching.sort_by(|a, b| compare_priority(a, b));

    let total = matching.len();
    let items = matching
        .into_iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .map(ChurchDetail::to_list_item)
        .collect();

    ChurchPage {
        page,
        page_size: PAGE_SIZE,
        total,
        items,
    }
}

/// Historic reformed first, then pass, caution, red flag, unevaluated; ties by name.
pub fn priority(church: &ChurchDetail) -> u8 {
    if church.confession_adopted {
        return 1;
    }
    match church.status() {
        Some(EvaluationStatus::Pass) => 2,
        Some(EvaluationStatus::Caution) => 3,
        Some(EvaluationStatus::RedFlag) => 4,
        None => 5,
    }
}

fn compare_priority(a: &ChurchDetail, b: &ChurchDetail) -> Ordering {
    priority(a)
        .cmp(&priority(b))
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Distinct filter values and directory totals.
pub fn meta(churches: &[ChurchDetail]) -> ChurchMeta {
    let states: BTreeSet<String> = churches
        .iter()
        .flat_map(|church| church.addresses.iter())
        .filter_map(|address| trimmed(address.state.as_deref()))
        .collect();
    let denominations: BTreeSet<String> = churches
        .iter()
        .filter_map(|church| trimmed(church.denomination.label.as_deref()))
        .collect();

    let overall = churches.len();
    let confessional = churches
        .iter()
        .filter(|church| church.confession_adopted)
        .count();

    ChurchMeta {
        states: states.into_iter().collect(),
        denominations: denominations.into_iter().collect(),
        totals: DirectoryTotals {
            overall,
            confessional,
            non_confessional: overall.saturating_sub(confessional),
        },
    }
}

pub fn existence(found: Option<&ChurchDetail>) -> ExistenceCheck {
    ExistenceCheck {
        exists: found.is_some(),
        church_id: found.map(|church| church.id),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn eq_ignore_case(value: Option<&str>, expected: &str) -> bool {
    value
        .map(|value| value.trim().to_lowercase() == expected.to_lowercase())
        .unwrap_or(false)
}
