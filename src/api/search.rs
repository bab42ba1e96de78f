use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::domain::model::{SearchQuery, SearchResult};

/// Handler for `GET /api/valve-search?query=...&manufacturer=...&type=...&size=...`
pub async fn valve_search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let Query(query) = query.map_err(ApiError::bad_query)?;
    let results = state
        .service
        .search_valves(&query)
        .await
        .map_err(ApiError::search_failure)?;

    Ok(Json(results))
}
