use crate::error::{AppError, Result};
use crate::model::{CreateShortLinkRequest, ShortLinkInfoQuery, ShortLinkResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use tinyurl_core::{LinkDetail, ShortCode, ShortenParams, ShortenerError};
use tracing::debug;

pub async fn create_short_link_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateShortLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShortLinkResponse>)> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let code = state
        .shortener()
        .shorten(ShortenParams::new(request.url, request.expiration_in_minutes))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShortLinkResponse {
            short_link: code.to_string(),
        }),
    ))
}

pub async fn short_link_info_handler(
    State(state): State<AppState>,
    Query(query): Query<ShortLinkInfoQuery>,
) -> Result<Json<LinkDetail>> {
    let detail = state.shortener().short_link_info(&query.short_link).await?;
    Ok(Json(detail))
}

pub async fn redirect_handler(
    Path(short_link): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    // Paths that cannot be a short code are unknown routes.
    if !ShortCode::is_valid(&short_link) {
        debug!(path = %short_link, "path is not a short code");
        return Err(ShortenerError::NotFound(short_link).into());
    }

    let url = state.shortener().unshorten(&short_link).await?;
    Ok(Redirect::temporary(&url))
}
