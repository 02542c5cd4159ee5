//! Content feed routes: pages, featured split, slug lookup, creation and views.

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use content_feed::{ContentId, ContentItem, ContentType, FirstPage, Page, ViewCountResponse};

use crate::common::PageArgs;
use crate::domains::content::{ContentItemRow, FeaturedParams, NewContentItem};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Unknown content types are routes that do not exist.
fn parse_content_type(raw: &str) -> Result<ContentType, ApiError> {
    raw.parse::<ContentType>()
        .map_err(|_| ApiError::NotFound(format!("unknown content type: {}", raw)))
}

fn into_items(rows: Vec<ContentItemRow>) -> Vec<ContentItem> {
    rows.into_iter().map(ContentItem::from).collect()
}

/// `GET /{content_type}?page=&page_size=`
pub async fn list_page_handler(
    Extension(state): Extension<AppState>,
    Path(content_type): Path<String>,
    Query(args): Query<PageArgs>,
) -> Result<Json<Page>, ApiError> {
    let content_type = parse_content_type(&content_type)?;
    let args = args
        .validate(state.deps.settings.default_page_size)
        .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;

    let rows = ContentItemRow::find_page(content_type, &args, &state.db_pool).await?;
    let page = Page::from_batch(into_items(rows), args.page, args.page_size);

    tracing::debug!(
        %content_type,
        page = args.page,
        returned = page.len(),
        has_more_hint = page.has_more_hint,
        "Served content page"
    );
    Ok(Json(page))
}

/// `GET /{content_type}/featured?page_size=`
pub async fn featured_handler(
    Extension(state): Extension<AppState>,
    Path(content_type): Path<String>,
    Query(params): Query<FeaturedParams>,
) -> Result<Json<FirstPage>, ApiError> {
    let content_type = parse_content_type(&content_type)?;
    let args = PageArgs {
        page: Some(1),
        page_size: params.page_size,
    }
    .validate(state.deps.settings.default_page_size)
    .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;

    let rows = ContentItemRow::find_page(content_type, &args, &state.db_pool).await?;
    let page = Page::from_batch(into_items(rows), 1, args.page_size);
    Ok(Json(FirstPage::split(page)))
}

/// `GET /{content_type}/by-slug/{slug}`
pub async fn by_slug_handler(
    Extension(state): Extension<AppState>,
    Path((content_type, slug)): Path<(String, String)>,
) -> Result<Json<ContentItem>, ApiError> {
    let content_type = parse_content_type(&content_type)?;

    ContentItemRow::find_by_slug(content_type, &slug, &state.db_pool)
        .await?
        .map(|row| Json(ContentItem::from(row)))
        .ok_or_else(|| ApiError::NotFound(format!("{} not found: {}", content_type, slug)))
}

/// `POST /{content_type}`
pub async fn create_content_handler(
    Extension(state): Extension<AppState>,
    Path(content_type): Path<String>,
    Json(input): Json<NewContentItem>,
) -> Result<(StatusCode, Json<ContentItem>), ApiError> {
    let content_type = parse_content_type(&content_type)?;
    input
        .validate()
        .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;

    let row = ContentItemRow::create(content_type, &input, &state.db_pool).await?;
    tracing::info!(%content_type, id = %row.id, slug = %row.slug, "Created content item");

    Ok((StatusCode::CREATED, Json(ContentItem::from(row))))
}

/// `POST /{content_type}/{id}/view`
pub async fn record_view_handler(
    Extension(state): Extension<AppState>,
    Path((content_type, id)): Path<(String, String)>,
) -> Result<Json<ViewCountResponse>, ApiError> {
    let content_type = parse_content_type(&content_type)?;
    let id = ContentId::parse(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid content id: {}", id)))?;

    let new_count = state.deps.view_counter.increment(content_type, id).await?;
    Ok(Json(ViewCountResponse { new_count }))
}
