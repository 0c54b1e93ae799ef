//! Image serving endpoint
//!
//! Serves uploaded book covers and author portraits from the blob store.
//! Uploads themselves go through the GraphQL mutations; this endpoint only
//! reads.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::AppState;

/// Serve a stored image by id
///
/// GET /images/:id
async fn serve_image(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.db.images().get(&id).await {
        Ok(Some(image)) => {
            let headers = [
                (header::CONTENT_TYPE, image.content_type),
                (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            ];
            (StatusCode::OK, headers, image.data).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Image not found").into_response(),
        Err(e) => {
            tracing::error!(error = %e, image_id = %id, "Failed to retrieve image");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve image").into_response()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/images/{id}", get(serve_image))
}
