use axum::{
    extract::{Extension, RawQuery},
    Json,
};
use content_feed::ContentItem;

use crate::domains::content::{ContentItemRow, SearchParams};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// `GET /search?q=&content_type=a&content_type=b&category=x`
///
/// Title match, newest first, capped at [`crate::domains::content::SEARCH_LIMIT`].
pub async fn search_handler(
    Extension(state): Extension<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<ContentItem>>, ApiError> {
    let request = SearchParams::parse(query.as_deref()).into_request()?;
    let rows = ContentItemRow::search(&request, &state.db_pool).await?;

    tracing::debug!(
        query = %request.query,
        content_types = request.content_types.len(),
        categories = request.categories.len(),
        hits = rows.len(),
        "Search served"
    );
    Ok(Json(rows.into_iter().map(ContentItem::from).collect()))
}
