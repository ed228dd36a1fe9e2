//! # Donation Disclosure
//!
//! Reveals how to pay a campaign's creator once a donor says how much they intend to give.
//!
//! ## States
//! - **Collecting**: donor types an amount, disclosing is only possible for a number above zero
//! - **Disclosed**: QR code (with UPI id and account name) when the campaign has one, bank fields
//!   otherwise. Going back keeps the amount that was typed
//! - **Not found**: terminal, reached on a missing campaign or a failed read, offers a way back
//!
//! ## Notes
//! - The amount never leaves the page state, nothing records a donation
//! - Empty optional details show as "Not provided"
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    fetch::{Phase, Slot, Ticket},
    listing::EXPLORE_PATH,
    models::{CURRENCY_SYMBOL, Campaign, CampaignSummary},
    store::CampaignStore,
    utils::{is_blank, or_not_provided, parse_amount},
};

pub const NOT_FOUND_MESSAGE: &str = "Campaign not found";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load campaign";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DonationError {
    #[error("Please enter a valid donation amount")]
    InvalidAmount,

    #[error("Campaign is not available")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    Collecting,
    Disclosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum PaymentDetails {
    #[serde(rename_all = "camelCase")]
    Qr {
        qr_url: String,
        upi_id: String,
        account_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Bank {
        account_name: String,
        account_number: String,
        ifsc_code: String,
        upi_id: String,
        reference: String,
    },
}

impl PaymentDetails {
    pub fn for_campaign(campaign: &Campaign) -> Self {
        let record = &campaign.record;
        let upi_id = or_not_provided(record.upi_id.as_deref());
        let account_name = or_not_provided(Some(record.account_name.as_str()));

        match record.gpay_qr.as_deref().filter(|qr| !is_blank(qr)) {
            Some(qr_url) => PaymentDetails::Qr {
                qr_url: qr_url.to_string(),
                upi_id,
                account_name,
            },
            None => PaymentDetails::Bank {
                account_name,
                account_number: or_not_provided(Some(record.account_number.as_str())),
                ifsc_code: or_not_provided(Some(record.ifsc_code.as_str())),
                upi_id,
                reference: format!("Donation to {}", record.title),
            },
        }
    }

    pub fn instructions(&self, amount: &str) -> String {
        match self {
            PaymentDetails::Qr { .. } => format!(
                "Scan the QR code below with your UPI app to complete the donation of {CURRENCY_SYMBOL}{amount}"
            ),
            PaymentDetails::Bank { reference, .. } => {
                format!("Please mention \"{reference}\" in the transfer description")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DonationView {
    Loading,
    #[serde(rename_all = "camelCase")]
    NotFound { message: String, back: String },
    #[serde(rename_all = "camelCase")]
    Collecting {
        campaign: CampaignSummary,
        amount: String,
        can_disclose: bool,
        note: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Disclosed {
        campaign: CampaignSummary,
        amount: String,
        note: Option<String>,
        instructions: String,
        payment: PaymentDetails,
    },
}

/// Donation page for one campaign id.
#[derive(Debug)]
pub struct DonationPage {
    id: String,
    slot: Slot<Option<Campaign>>,
    amount: String,
    stage: Stage,
}

impl DonationPage {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slot: Slot::default(),
            amount: String::new(),
            stage: Stage::Collecting,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn activate(&mut self) -> Ticket {
        self.slot.begin()
    }

    pub fn resolve(&mut self, ticket: Ticket, result: Result<Option<Campaign>, StoreError>) -> bool {
        match &result {
            Ok(None) => debug!("Campaign {} not found", self.id),
            Err(err) => warn!("Error fetching campaign {}: {err}", self.id),
            Ok(Some(_)) => {}
        }

        self.slot.resolve(ticket, result)
    }

    pub fn dispose(&mut self) {
        self.slot.dispose();
    }

    /// Switches to another campaign id, starting over from an empty amount.
    pub fn navigate(&mut self, id: impl Into<String>) -> Ticket {
        self.id = id.into();
        self.amount.clear();
        self.stage = Stage::Collecting;
        self.activate()
    }

    pub async fn load(&mut self, store: &dyn CampaignStore) {
        let ticket = self.activate();
        let result = store.get_campaign(&self.id).await;
        self.resolve(ticket, result);
    }

    pub fn campaign(&self) -> Option<&Campaign> {
        self.slot.ready().and_then(Option::as_ref)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn enter_amount(&mut self, amount: impl Into<String>) {
        self.amount = amount.into();
    }

    pub fn can_disclose(&self) -> bool {
        self.campaign().is_some() && parse_amount(&self.amount).is_some()
    }

    pub fn disclose(&mut self) -> Result<(), DonationError> {
        if self.campaign().is_none() {
            return Err(DonationError::Unavailable);
        }
        if parse_amount(&self.amount).is_none() {
            return Err(DonationError::InvalidAmount);
        }

        self.stage = Stage::Disclosed;
        Ok(())
    }

    /// Back to the amount entry, keeping what was typed.
    pub fn conceal(&mut self) {
        self.stage = Stage::Collecting;
    }

    fn note(&self, campaign: &Campaign) -> Option<String> {
        (!self.amount.is_empty()).then(|| {
            format!(
                "You're about to donate {CURRENCY_SYMBOL}{} to {}",
                self.amount, campaign.record.title
            )
        })
    }

    pub fn view(&self) -> DonationView {
        let campaign = match self.slot.phase() {
            Phase::Idle | Phase::Loading => return DonationView::Loading,
            Phase::Ready(Some(campaign)) => campaign,
            Phase::Ready(None) => return not_found(NOT_FOUND_MESSAGE),
            Phase::Failed(_) => return not_found(LOAD_FAILED_MESSAGE),
        };

        match self.stage {
            Stage::Collecting => DonationView::Collecting {
                campaign: campaign.summary(),
                amount: self.amount.clone(),
                can_disclose: self.can_disclose(),
                note: self.note(campaign),
            },
            Stage::Disclosed => {
                let payment = PaymentDetails::for_campaign(campaign);
                DonationView::Disclosed {
                    campaign: campaign.summary(),
                    amount: self.amount.clone(),
                    note: self.note(campaign),
                    instructions: payment.instructions(&self.amount),
                    payment,
                }
            }
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.slot.phase(), Phase::Failed(_))
    }
}

fn not_found(message: &str) -> DonationView {
    DonationView::NotFound {
        message: message.to_string(),
        back: EXPLORE_PATH.to_string(),
    }
}
