use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, instrument, warn};

use crate::booking::{BookingError, BookingForm};
use crate::catalog::{RoomListParams, RoomQuery};
use crate::contact::{ContactError, ContactForm};
use crate::model::Language;
use crate::reconcile::{self, Notification, ReconcileError};
use crate::render;
use crate::server::AppState;

/// Failures that end up as a plain 500.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(error = ?self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Requests issued by the site's own scripts.
pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

/// `lang` query parameter, then the first recognised Accept-Language entry.
fn pick_language(explicit: Option<&str>, headers: &HeaderMap, fallback: Language) -> Language {
    if let Some(lang) = explicit.and_then(Language::parse_tag) {
        return lang;
    }
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|accept| {
            accept
                .split(',')
                .filter_map(|entry| entry.split(';').next())
                .find_map(Language::parse_tag)
        })
        .unwrap_or(fallback)
}

const CONTACT_SENT_LOCATION: &str = "/contact/?sent=1#contact-form-wrapper";

/// Redirect carrying a flash message in the query string.
fn redirect_with_error(path: &str, message: &str) -> Redirect {
    let query = Url::parse_with_params("http://localhost/", [("error", message)])
        .ok()
        .and_then(|url| url.query().map(str::to_string))
        .unwrap_or_default();
    Redirect::to(&format!("{path}?{query}"))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "lonergarden",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[instrument(skip_all)]
pub async fn rooms(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<RoomListParams>,
) -> Result<Response, AppError> {
    let lang = pick_language(params.lang.as_deref(), &headers, state.default_language);
    let query = RoomQuery::from_params(&params);
    let page = state.catalog.list(&query).await?;

    if is_ajax(&headers) {
        return Ok(Json(json!({
            "html": render::rooms_grid(&page.rooms, lang),
            "has_more": page.has_more,
            "next_offset": page.next_offset,
        }))
        .into_response());
    }
    Ok(Html(render::rooms_page(&page, &params, lang)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct FlashParams {
    pub error: Option<String>,
}

pub async fn booking_page(
    State(state): State<Arc<AppState>>,
    Query(flash): Query<FlashParams>,
) -> Html<String> {
    Html(render::booking_page(
        flash.error.as_deref(),
        state.bookings.rates(),
    ))
}

#[instrument(skip_all)]
pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<BookingForm>,
) -> Response {
    let ajax = is_ajax(&headers);
    match state.bookings.submit(&form).await {
        Ok(receipt) if ajax => Json(json!({ "snap_token": receipt.snap_token })).into_response(),
        Ok(receipt) => Html(render::payment_page(
            &receipt,
            &state.client_key,
            state.is_production,
        ))
        .into_response(),
        Err(err) => {
            match &err {
                BookingError::Storage(cause) => error!(error = ?cause, "booking storage failure"),
                BookingError::Gateway(cause) => warn!(error = %cause, "booking gateway failure"),
                _ => warn!(error = %err, "booking rejected"),
            }
            let message = err.user_message();
            if ajax {
                let status = if err.is_retryable() {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::BAD_REQUEST
                };
                (status, Json(json!({ "error": message }))).into_response()
            } else {
                redirect_with_error("/booking/", &message).into_response()
            }
        }
    }
}

pub async fn payment_finish() -> Html<String> {
    Html(render::payment_finish_page())
}

/// Gateway notification callback. Always answers with JSON.
#[instrument(skip_all)]
pub async fn payment_notification(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let notification: Notification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!(%e, "malformed payment notification");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response();
        }
    };

    match reconcile::reconcile(&state.pool, &notification).await {
        Ok(status) => Json(json!({
            "status": "ok",
            "order_id": notification.order_id,
            "payment_status": status.as_str(),
        }))
        .into_response(),
        Err(ReconcileError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "error", "message": "Booking not found" })),
        )
            .into_response(),
        Err(ReconcileError::Storage(cause)) => {
            error!(error = ?cause, order_id = %notification.order_id, "failed to reconcile payment");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "internal error" })),
            )
                .into_response()
        }
    }
}

pub async fn payment_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "status": "invalid method" })),
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactParams {
    pub sent: Option<String>,
}

pub async fn contact_page(Query(params): Query<ContactParams>) -> Html<String> {
    let sent = params.sent.as_deref() == Some("1");
    Html(render::contact_page(&ContactForm::default(), None, sent))
}

#[instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    match state.contact.submit(&form).await {
        Ok(_) => Ok(Redirect::to(CONTACT_SENT_LOCATION).into_response()),
        Err(ContactError::Validation(errors)) => {
            Ok(Html(render::contact_page(&form, Some(&errors), false)).into_response())
        }
        Err(ContactError::Storage(cause)) => Err(AppError(cause)),
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_page(&state, "index").await
}

pub async fn page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
) -> Result<Response, AppError> {
    serve_page(&state, &page).await
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> Response {
    (StatusCode::NOT_FOUND, Html(state.pages.not_found().await)).into_response()
}

async fn serve_page(state: &AppState, page: &str) -> Result<Response, AppError> {
    match state.pages.load(page).await? {
        Some(html) => Ok(Html(html).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Html(state.pages.not_found().await)).into_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn ajax_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_ajax(&headers));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        assert!(is_ajax(&headers));
    }

    #[test]
    fn language_resolution_order() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("pt-BR,de;q=0.8,en;q=0.5"),
        );
        assert_eq!(pick_language(Some("ja"), &headers, Language::En), Language::Ja);
        assert_eq!(pick_language(Some("xx"), &headers, Language::En), Language::De);
        assert_eq!(pick_language(None, &HeaderMap::new(), Language::Id), Language::Id);
    }

    #[test]
    fn flash_redirect_encodes_message() {
        let res = redirect_with_error("/booking/", "Departure must be after arrival").into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).unwrap(),
            "/booking/?error=Departure+must+be+after+arrival"
        );
    }
}
