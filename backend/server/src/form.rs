//! # Campaign Form
//!
//! Collects a new campaign from a signed-in creator and writes it once.
//!
//! ## Validation
//! - Title, description, account holder, account number and IFSC code must be non-empty after trimming
//! - Target amount must parse as a number above zero
//! - Category must be one of the listed ones
//! - An image must be attached
//! - Image and QR files arrive as upload URLs, their size and type were checked at upload
//!
//! ## Errors
//! One message per invalid field. Editing a field clears that field's message and nothing else.
//!
//! ## Submission
//! - On success every field returns to its default
//! - On a store failure the draft is left untouched so the creator can retry
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::StoreError,
    models::{CampaignRecord, Category},
    store::CampaignStore,
    uploads::UploadKind,
    utils::{is_blank, non_blank, parse_amount},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Title,
    Description,
    Category,
    TargetAmount,
    Image,
    AccountName,
    AccountNumber,
    IfscCode,
    UpiId,
    GpayQr,
}

impl From<UploadKind> for FormField {
    fn from(kind: UploadKind) -> Self {
        match kind {
            UploadKind::Image => FormField::Image,
            UploadKind::Qr => FormField::GpayQr,
        }
    }
}

pub type FieldErrors = BTreeMap<FormField, String>;

/// What the creator has typed so far. Everything stays raw text until submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignDraft {
    pub title: String,
    pub description: String,
    pub category: String,
    pub target_amount: String,
    pub image: Option<String>,
    pub account_name: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub upi_id: String,
    pub gpay_qr: Option<String>,
}

impl Default for CampaignDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: Category::default().to_string(),
            target_amount: String::new(),
            image: None,
            account_name: String::new(),
            account_number: String::new(),
            ifsc_code: String::new(),
            upi_id: String::new(),
            gpay_qr: None,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Invalid(FieldErrors),
    Created(String),
    Failed(StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignForm {
    pub draft: CampaignDraft,
    pub errors: FieldErrors,
}

impl CampaignForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_draft(draft: CampaignDraft) -> Self {
        Self {
            draft,
            errors: FieldErrors::new(),
        }
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Updates one field and clears its error.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        let draft = &mut self.draft;

        match field {
            FormField::Title => draft.title = value,
            FormField::Description => draft.description = value,
            FormField::Category => draft.category = value,
            FormField::TargetAmount => draft.target_amount = value,
            FormField::AccountName => draft.account_name = value,
            FormField::AccountNumber => draft.account_number = value,
            FormField::IfscCode => draft.ifsc_code = value,
            FormField::UpiId => draft.upi_id = value,
            FormField::Image => draft.image = non_blank(&value),
            FormField::GpayQr => draft.gpay_qr = non_blank(&value),
        }

        self.errors.remove(&field);
    }

    /// Recomputes every field error. Returns whether the draft may be written.
    pub fn validate(&mut self) -> bool {
        let draft = &self.draft;
        let mut errors = FieldErrors::new();

        let mut require = |field: FormField, value: &str, message: &str| {
            if is_blank(value) {
                errors.insert(field, message.to_string());
            }
        };

        require(FormField::Title, &draft.title, "Campaign title is required");
        require(
            FormField::Description,
            &draft.description,
            "Description is required",
        );
        require(
            FormField::AccountName,
            &draft.account_name,
            "Account holder name is required",
        );
        require(
            FormField::AccountNumber,
            &draft.account_number,
            "Account number is required",
        );
        require(FormField::IfscCode, &draft.ifsc_code, "IFSC code is required");

        if parse_amount(&draft.target_amount).is_none() {
            errors.insert(
                FormField::TargetAmount,
                "Please enter a valid target amount".to_string(),
            );
        }

        if draft.image.as_deref().is_none_or(is_blank) {
            errors.insert(FormField::Image, "Campaign image is required".to_string());
        }

        if !draft.category.trim().parse::<Category>().is_ok_and(|c| c.is_listed()) {
            errors.insert(
                FormField::Category,
                "Please choose a listed category".to_string(),
            );
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validates and converts the draft into the record the store receives.
    pub fn record(&mut self, now: DateTime<Utc>) -> Result<CampaignRecord, FieldErrors> {
        if !self.validate() {
            return Err(self.errors.clone());
        }

        let draft = &self.draft;
        let Ok(category) = draft.category.trim().parse::<Category>();

        Ok(CampaignRecord {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            category,
            target_amount: parse_amount(&draft.target_amount).unwrap_or_default(),
            image: draft.image.clone().unwrap_or_default(),
            account_name: draft.account_name.trim().to_string(),
            account_number: draft.account_number.trim().to_string(),
            ifsc_code: draft.ifsc_code.trim().to_string(),
            upi_id: non_blank(&draft.upi_id),
            gpay_qr: draft.gpay_qr.as_deref().and_then(non_blank),
            created_at: now,
        })
    }

    pub async fn submit(&mut self, store: &dyn CampaignStore, now: DateTime<Utc>) -> SubmitOutcome {
        let record = match self.record(now) {
            Ok(record) => record,
            Err(errors) => return SubmitOutcome::Invalid(errors),
        };

        match store.create_campaign(record).await {
            Ok(id) => {
                info!("Campaign {id} created");
                *self = Self::default();
                SubmitOutcome::Created(id)
            }
            Err(err) => {
                error!("Error adding campaign: {err}");
                SubmitOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::{
        models::Campaign,
        store::{ListQuery, MemoryStore},
    };

    struct RefusingStore;

    #[async_trait]
    impl CampaignStore for RefusingStore {
        fn backend_tag(&self) -> &'static str {
            "refusing"
        }

        async fn create_campaign(&self, _record: CampaignRecord) -> Result<String, StoreError> {
            Err(StoreError::Write("permission denied".into()))
        }

        async fn get_campaign(&self, _id: &str) -> Result<Option<Campaign>, StoreError> {
            Ok(None)
        }

        async fn list_campaigns(&self, _query: ListQuery) -> Result<Vec<Campaign>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    fn filled() -> CampaignForm {
        let mut form = CampaignForm::new();
        form.set(FormField::Title, "  Clean the river ");
        form.set(FormField::Description, "Nets and boats");
        form.set(FormField::Category, "Environment");
        form.set(FormField::TargetAmount, "2500.75");
        form.set(FormField::AccountName, "River Trust");
        form.set(FormField::AccountNumber, "123456789");
        form.set(FormField::IfscCode, "HDFC0000123");
        form.set(FormField::Image, "/uploads/river");
        form
    }

    #[test]
    fn default_form_reports_required_fields() {
        let mut form = CampaignForm::new();
        assert!(!form.validate());

        for field in [
            FormField::Title,
            FormField::Description,
            FormField::TargetAmount,
            FormField::Image,
            FormField::AccountName,
            FormField::AccountNumber,
            FormField::IfscCode,
        ] {
            assert!(form.error(field).is_some(), "{field:?} should be flagged");
        }
        assert_eq!(form.error(FormField::Category), None);
        assert_eq!(form.error(FormField::UpiId), None);
        assert_eq!(form.error(FormField::GpayQr), None);
    }

    #[test]
    fn whitespace_only_text_is_rejected() {
        for field in [
            FormField::Title,
            FormField::Description,
            FormField::AccountName,
            FormField::AccountNumber,
            FormField::IfscCode,
        ] {
            let mut form = filled();
            form.set(field, "   ");
            assert!(!form.validate());
            assert_eq!(form.errors.len(), 1);
            assert!(form.error(field).is_some());
        }
    }

    #[test]
    fn target_must_be_positive_number() {
        for amount in ["0", "-5", "abc", ""] {
            let mut form = filled();
            form.set(FormField::TargetAmount, amount);
            assert!(!form.validate());
            assert_eq!(
                form.error(FormField::TargetAmount),
                Some("Please enter a valid target amount")
            );
        }
    }

    #[test]
    fn unlisted_category_is_rejected() {
        let mut form = filled();
        form.set(FormField::Category, "Other");
        assert!(!form.validate());
        assert!(form.error(FormField::Category).is_some());
    }

    #[test]
    fn editing_clears_only_that_error() {
        let mut form = CampaignForm::new();
        form.validate();
        let before = form.errors.len();

        form.set(FormField::Title, "x");
        assert_eq!(form.error(FormField::Title), None);
        assert_eq!(form.errors.len(), before - 1);
        assert!(form.error(FormField::Description).is_some());
    }

    #[test]
    fn upload_fields_take_urls() {
        let mut form = filled();
        form.set(FormField::GpayQr, "/uploads/qr");
        assert_eq!(form.draft.gpay_qr.as_deref(), Some("/uploads/qr"));

        form.set(FormField::Image, "  ");
        assert_eq!(form.draft.image, None);
        assert!(!form.validate());
        assert_eq!(
            form.error(FormField::Image),
            Some("Campaign image is required")
        );
    }

    #[test]
    fn record_is_trimmed_and_stamped() {
        let mut form = filled();
        form.set(FormField::UpiId, "   ");

        let record = form.record(now()).unwrap();
        assert_eq!(record.title, "Clean the river");
        assert_eq!(record.category, Category::Environment);
        assert_eq!(record.target_amount, 2500.75);
        assert_eq!(record.upi_id, None);
        assert_eq!(record.created_at, now());
    }

    #[tokio::test]
    async fn successful_submit_resets_to_defaults() {
        let store = MemoryStore::new();
        let mut form = filled();

        let outcome = form.submit(&store, now()).await;
        assert!(matches!(outcome, SubmitOutcome::Created(_)));
        assert_eq!(form, CampaignForm::default());

        let stored = store.list_campaigns(ListQuery::all()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.ifsc_code, "HDFC0000123");
    }

    #[tokio::test]
    async fn invalid_submit_never_reaches_store() {
        let store = MemoryStore::new();
        let mut form = filled();
        form.set(FormField::Title, "");

        let outcome = form.submit(&store, now()).await;
        assert!(matches!(outcome, SubmitOutcome::Invalid(errors) if errors.contains_key(&FormField::Title)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn failed_write_preserves_draft() {
        let mut form = filled();
        let draft = form.draft.clone();

        let outcome = form.submit(&RefusingStore, now()).await;
        assert!(matches!(outcome, SubmitOutcome::Failed(StoreError::Write(_))));
        assert_eq!(form.draft, draft);
    }
}
