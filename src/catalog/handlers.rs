use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{error::ApiError, state::AppState, store::Listing};

use super::dto::SearchQuery;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(public_catalog))
        .route("/catalog/search", get(search))
}

/// Unauthenticated. A listing appears here iff its lifecycle is `active`
/// and its sale status is `approved`; the owner's account state is
/// irrelevant.
#[instrument(skip(state))]
pub async fn public_catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.store.public_catalog().await?))
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let filter = query.into_filter();
    Ok(Json(state.store.search_catalog(&filter).await?))
}
