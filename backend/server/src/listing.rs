//! # Listing
//!
//! Explore page and homepage cards. Both read straight from the store on activation, nothing is
//! cached between them.
//!
//! ## Explore
//! - Pulls the entire collection with no order or limit
//! - Filter buttons are "All" followed by each category present in the data, first appearance first
//! - Filtering is a plain category equality over the retrieved set and keeps retrieval order
//! - Empty results say whether nothing exists at all or nothing matches the chosen filter, the
//!   latter with a way back to "All"
//!
//! ## Featured
//! - Newest three campaigns by `createdAt`
//! - A call to action replaces the cards when there are none
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::StoreError,
    fetch::{Phase, Slot, Ticket},
    models::{Campaign, CampaignSummary, Category},
    store::{CampaignStore, ListQuery},
};

pub const ALL: &str = "All";
pub const FEATURED_COUNT: usize = 3;
pub const EXPLORE_PATH: &str = "/explore";
pub const CREATE_PATH: &str = "/create-campaign";

/// The chosen filter button. A value naming no category matches nothing and is echoed back as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Filter {
    #[default]
    All,
    Category(Category),
    Unknown(String),
}

impl Filter {
    pub fn label(&self) -> &str {
        match self {
            Filter::All => ALL,
            Filter::Category(category) => category.as_str(),
            Filter::Unknown(value) => value,
        }
    }

    pub fn matches(&self, campaign: &Campaign) -> bool {
        match self {
            Filter::All => true,
            Filter::Category(category) => campaign.record.category == *category,
            Filter::Unknown(_) => false,
        }
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Filter::from(value.as_str())
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL {
            return Filter::All;
        }

        let Ok(category) = value.parse::<Category>();
        if category.as_str() == value {
            Filter::Category(category)
        } else {
            Filter::Unknown(value.to_string())
        }
    }
}

impl From<Filter> for String {
    fn from(value: Filter) -> Self {
        match value {
            Filter::Unknown(value) => value,
            other => other.label().to_string(),
        }
    }
}

/// "All" followed by every distinct category in `campaigns`.
pub fn categories(campaigns: &[Campaign]) -> Vec<String> {
    let mut seen: Vec<Category> = Vec::new();
    for campaign in campaigns {
        if !seen.contains(&campaign.record.category) {
            seen.push(campaign.record.category);
        }
    }

    std::iter::once(ALL.to_string())
        .chain(seen.iter().map(|category| category.to_string()))
        .collect()
}

pub fn filter_campaigns<'a>(campaigns: &'a [Campaign], filter: &Filter) -> Vec<&'a Campaign> {
    campaigns
        .iter()
        .filter(|campaign| filter.matches(campaign))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EmptyState {
    NoCampaigns,
    NoMatches { category: String, reset: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingView {
    pub loading: bool,
    pub categories: Vec<String>,
    pub selected: Filter,
    pub campaigns: Vec<CampaignSummary>,
    pub empty: Option<EmptyState>,
}

#[derive(Debug, Default)]
pub struct Listing {
    slot: Slot<Vec<Campaign>>,
    filter: Filter,
}

impl Listing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self) -> Ticket {
        self.slot.begin()
    }

    pub fn resolve(&mut self, ticket: Ticket, result: Result<Vec<Campaign>, StoreError>) -> bool {
        if let Err(err) = &result {
            warn!("Error fetching campaigns: {err}");
        }

        self.slot.resolve(ticket, result)
    }

    pub fn dispose(&mut self) {
        self.slot.dispose();
    }

    pub async fn load(&mut self, store: &dyn CampaignStore) {
        let ticket = self.activate();
        let result = store.list_campaigns(ListQuery::all()).await;
        self.resolve(ticket, result);
    }

    pub fn select(&mut self, filter: impl Into<Filter>) {
        self.filter = filter.into();
    }

    pub fn reset_filter(&mut self) {
        self.filter = Filter::All;
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn retrieved(&self) -> &[Campaign] {
        self.slot.ready().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<String> {
        categories(self.retrieved())
    }

    pub fn displayed(&self) -> Vec<&Campaign> {
        filter_campaigns(self.retrieved(), &self.filter)
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.slot.ready().is_none() || !self.displayed().is_empty() {
            return None;
        }

        Some(match &self.filter {
            Filter::All => EmptyState::NoCampaigns,
            filter => EmptyState::NoMatches {
                category: filter.label().to_string(),
                reset: EXPLORE_PATH.to_string(),
            },
        })
    }

    pub fn view(&self) -> Result<ListingView, StoreError> {
        if let Phase::Failed(err) = self.slot.phase() {
            return Err(err.clone());
        }

        Ok(ListingView {
            loading: self.slot.is_loading(),
            categories: self.categories(),
            selected: self.filter.clone(),
            campaigns: self
                .displayed()
                .into_iter()
                .map(Campaign::summary)
                .collect(),
            empty: self.empty_state(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedView {
    pub loading: bool,
    pub campaigns: Vec<CampaignSummary>,
    pub call_to_action: Option<String>,
}

#[derive(Debug, Default)]
pub struct Featured {
    slot: Slot<Vec<Campaign>>,
}

impl Featured {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self) -> Ticket {
        self.slot.begin()
    }

    pub fn resolve(&mut self, ticket: Ticket, result: Result<Vec<Campaign>, StoreError>) -> bool {
        if let Err(err) = &result {
            warn!("Error fetching featured campaigns: {err}");
        }

        self.slot.resolve(ticket, result)
    }

    pub fn dispose(&mut self) {
        self.slot.dispose();
    }

    pub async fn load(&mut self, store: &dyn CampaignStore) {
        let ticket = self.activate();
        let result = store
            .list_campaigns(ListQuery::newest(FEATURED_COUNT))
            .await;
        self.resolve(ticket, result);
    }

    pub fn view(&self) -> Result<FeaturedView, StoreError> {
        let campaigns: Vec<CampaignSummary> = match self.slot.phase() {
            Phase::Failed(err) => return Err(err.clone()),
            Phase::Ready(campaigns) => campaigns.iter().map(Campaign::summary).collect(),
            Phase::Idle | Phase::Loading => Vec::new(),
        };

        let loading = self.slot.is_loading();
        let call_to_action = (!loading && campaigns.is_empty()).then(|| CREATE_PATH.to_string());

        Ok(FeaturedView {
            loading,
            campaigns,
            call_to_action,
        })
    }
}
