use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{
        self, Path, Query,
        rejection::{BytesRejection, JsonRejection},
    },
    http::{
        HeaderMap, StatusCode,
        header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    },
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{
    donation::{DonationPage, DonationView, Stage},
    error::AppError,
    form::{CampaignDraft, CampaignForm, FieldErrors, FormField, SubmitOutcome},
    listing::{Featured, FeaturedView, Listing, ListingView},
    state::State,
    uploads::UploadKind,
};

type SharedState = extract::State<Arc<State>>;

pub const CREATED_MESSAGE: &str = "Campaign Created Successfully!";

pub async fn featured_handler(
    extract::State(state): SharedState,
) -> Result<Json<FeaturedView>, AppError> {
    let mut featured = Featured::new();
    featured.load(state.store.as_ref()).await;

    Ok(Json(featured.view()?))
}

#[derive(Deserialize)]
pub struct ExploreParams {
    category: Option<String>,
}

pub async fn explore_handler(
    extract::State(state): SharedState,
    Query(params): Query<ExploreParams>,
) -> Result<Json<ListingView>, AppError> {
    let mut listing = Listing::new();
    listing.load(state.store.as_ref()).await;

    if let Some(category) = params.category.as_deref() {
        listing.select(category);
    }

    Ok(Json(listing.view()?))
}

pub async fn form_handler() -> Json<CampaignForm> {
    Json(CampaignForm::new())
}

pub async fn create_handler(
    extract::State(state): SharedState,
    payload: Result<Json<CampaignDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(draft) = payload.map_err(|_| AppError::MalformedPayload)?;
    let mut form = CampaignForm::from_draft(draft);

    let response = match form.submit(state.store.as_ref(), Utc::now()).await {
        SubmitOutcome::Created(id) => (
            StatusCode::CREATED,
            Json(json!({ "id": id, "message": CREATED_MESSAGE, "form": form })),
        ),
        SubmitOutcome::Invalid(fields) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": AppError::Validation(FieldErrors::new()).to_string(),
                "fields": fields,
                "form": form,
            })),
        ),
        SubmitOutcome::Failed(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": AppError::from(err).to_string(), "form": form })),
        ),
    };

    Ok(response.into_response())
}

fn refuse(kind: UploadKind, message: &str) -> AppError {
    AppError::Validation(FieldErrors::from([(FormField::from(kind), message.to_string())]))
}

async fn store_upload(
    state: Arc<State>,
    kind: UploadKind,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    // the route's body limit is the kind's size limit
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(refuse(kind, kind.too_large_message()));
        }
        Err(_) => return Err(AppError::MalformedPayload),
    };
    if body.is_empty() {
        return Err(AppError::MalformedPayload);
    }

    kind.check(content_type, body.len())
        .map_err(|message| refuse(kind, message))?;

    let upload = state.uploads.put(content_type, body).await;
    info!(
        "Stored {kind} upload of {} bytes, {} bytes held",
        upload.size,
        state.uploads.total_bytes().await
    );

    Ok((StatusCode::CREATED, Json(upload)).into_response())
}

pub async fn image_upload_handler(
    extract::State(state): SharedState,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    store_upload(state, UploadKind::Image, headers, body).await
}

pub async fn qr_upload_handler(
    extract::State(state): SharedState,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AppError> {
    store_upload(state, UploadKind::Qr, headers, body).await
}

pub async fn upload_file_handler(
    extract::State(state): SharedState,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let file = state.uploads.get(&id).await.ok_or(AppError::NotFound)?;

    let headers = [
        (CONTENT_TYPE, file.content_type),
        (X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
    ];

    Ok((headers, file.bytes).into_response())
}

#[derive(Deserialize)]
pub struct DonateParams {
    #[serde(default)]
    amount: String,
    #[serde(default)]
    step: Stage,
}

pub async fn donate_handler(
    extract::State(state): SharedState,
    Path(id): Path<String>,
    Query(params): Query<DonateParams>,
) -> Response {
    let mut page = DonationPage::new(id);
    page.load(state.store.as_ref()).await;
    page.enter_amount(params.amount);

    if let DonationView::NotFound { .. } = page.view() {
        let status = if page.failed() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::NOT_FOUND
        };
        return (status, Json(page.view())).into_response();
    }

    if params.step == Stage::Disclosed && page.disclose().is_err() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(page.view())).into_response();
    }

    (StatusCode::OK, Json(page.view())).into_response()
}

pub async fn sign_in_handler(extract::State(state): SharedState) -> Redirect {
    Redirect::to(&state.config.sign_in_url)
}

pub async fn sign_up_handler(extract::State(state): SharedState) -> Redirect {
    Redirect::to(&state.config.sign_up_url)
}
