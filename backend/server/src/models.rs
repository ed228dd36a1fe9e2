//! # Campaigns
//!
//! The only persisted entity. Stored as one flat document per campaign, no nested
//! sub-documents and no schema version.
//!
//! ## Lifecycle
//! - Created exactly once through the campaign form
//! - Read by the listing, featured and donation views
//! - Never updated or deleted
//!
//! ## Notes
//! - `targetAmount` is only checked when the form submits it, nothing tracks funds raised
//! - `createdAt` comes from the submitting side's clock
//! - Nothing stops a foreign writer from storing an unlisted category, so reads map those to
//!   [`Category::Other`]
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CURRENCY_SYMBOL: &str = "₹";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Health,
    Education,
    Technology,
    Environment,
    Community,
    Arts,
    Other,
}

impl Category {
    /// Categories a creator may pick, in form order.
    pub const LISTED: [Category; 6] = [
        Category::Health,
        Category::Education,
        Category::Technology,
        Category::Environment,
        Category::Community,
        Category::Arts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Technology => "Technology",
            Category::Environment => "Environment",
            Category::Community => "Community",
            Category::Arts => "Arts",
            Category::Other => "Other",
        }
    }

    pub fn is_listed(&self) -> bool {
        !matches!(self, Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::LISTED
            .into_iter()
            .find(|category| category.as_str() == s)
            .unwrap_or(Category::Other))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        let Ok(category) = value.parse::<Category>();
        category
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

/// Campaign fields as written by the form, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub target_amount: f64,
    pub image: String,
    pub account_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpay_qr: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(flatten)]
    pub record: CampaignRecord,
}

impl Campaign {
    pub fn new(id: String, record: CampaignRecord) -> Self {
        Self { id, record }
    }

    pub fn summary(&self) -> CampaignSummary {
        CampaignSummary {
            id: self.id.clone(),
            title: self.record.title.clone(),
            description: self.record.description.clone(),
            category: self.record.category,
            target_amount: self.record.target_amount,
            target_display: format!("{CURRENCY_SYMBOL}{}", self.record.target_amount),
            image: self.record.image.clone(),
            created_at: self.record.created_at,
            donate: format!("/donate/{}", self.id),
        }
    }
}

/// Card-sized view of a campaign. Payout details stay on the donation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub target_amount: f64,
    pub target_display: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub donate: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::*;

    pub fn record(title: &str, category: Category, minute: u32) -> CampaignRecord {
        CampaignRecord {
            title: title.to_string(),
            description: format!("{title} description"),
            category,
            target_amount: 5000.0,
            image: "/uploads/image".to_string(),
            account_name: "A Holder".to_string(),
            account_number: "0011223344".to_string(),
            ifsc_code: "SBIN0000001".to_string(),
            upi_id: None,
            gpay_qr: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{fixtures::record, *};

    #[test]
    fn unknown_categories_fall_into_other() {
        assert_eq!("Health".parse::<Category>().unwrap(), Category::Health);
        assert_eq!("Sports".parse::<Category>().unwrap(), Category::Other);
        assert_eq!("health".parse::<Category>().unwrap(), Category::Other);
        assert!(!Category::Other.is_listed());
    }

    #[test]
    fn campaign_document_is_flat() {
        let campaign = Campaign::new("7".into(), record("Clinic", Category::Health, 0));
        let value = serde_json::to_value(&campaign).unwrap();

        assert_eq!(value["id"], json!("7"));
        assert_eq!(value["category"], json!("Health"));
        assert_eq!(value["targetAmount"], json!(5000.0));
        assert_eq!(value["ifscCode"], json!("SBIN0000001"));
        assert!(value.get("upiId").is_none());
        assert!(value.get("record").is_none());
    }

    #[test]
    fn foreign_documents_still_decode() {
        let doc = json!({
            "id": "abc",
            "title": "Mural",
            "description": "Paint the wall",
            "category": "Street Art",
            "targetAmount": 120.5,
            "image": "blob:x",
            "accountName": "N",
            "accountNumber": "1",
            "ifscCode": "I",
            "upiId": "",
            "createdAt": "2025-02-01T10:00:00Z"
        });

        let campaign: Campaign = serde_json::from_value(doc).unwrap();
        assert_eq!(campaign.record.category, Category::Other);
        assert_eq!(campaign.record.upi_id.as_deref(), Some(""));
        assert_eq!(campaign.record.gpay_qr, None);
    }

    #[test]
    fn summary_hides_payout_details() {
        let campaign = Campaign::new("3".into(), record("School", Category::Education, 1));
        let summary = serde_json::to_value(campaign.summary()).unwrap();

        assert_eq!(summary["donate"], json!("/donate/3"));
        assert_eq!(summary["targetDisplay"], json!("₹5000"));
        assert!(summary.get("accountNumber").is_none());
    }
}
