use chrono::{DateTime, Utc};
use content_feed::{ContentType, FeedError, SearchRequest};
use serde::Deserialize;
use url::form_urlencoded;

/// Body of `POST /{content_type}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContentItem {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewContentItem {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.slug.trim().is_empty() {
            return Err("slug must not be empty");
        }
        if self.slug.contains('/') {
            return Err("slug must not contain '/'");
        }
        if self.title.trim().is_empty() {
            return Err("title must not be empty");
        }
        Ok(())
    }
}

/// Query string of `GET /{content_type}/featured`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeaturedParams {
    pub page_size: Option<u32>,
}

/// Query string of `GET /search`.
///
/// `content_type` and `category` may repeat. Repeated values of one key are
/// alternatives; the two keys are combined with AND. Values are taken
/// verbatim, so a category may contain commas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub q: String,
    pub content_types: Vec<String>,
    pub categories: Vec<String>,
}

impl SearchParams {
    /// Parse a raw, still percent-encoded query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut params = SearchParams::default();
        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "q" => params.q = value.into_owned(),
                "content_type" => params.content_types.push(value.into_owned()),
                "category" => params.categories.push(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    pub fn into_request(self) -> Result<SearchRequest, FeedError> {
        let mut request = SearchRequest::new(self.q.trim());

        for raw in non_blank(&self.content_types) {
            request = request.with_content_type(raw.parse::<ContentType>()?);
        }
        for category in non_blank(&self.categories) {
            request = request.with_category(category);
        }

        Ok(request)
    }
}

fn non_blank(values: &[String]) -> impl Iterator<Item = &str> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_params_collect_repeated_keys() {
        let params = SearchParams::parse(Some(
            "q=+shabbat+&content_type=article&content_type=video&category=halacha&category=",
        ));

        let request = params.into_request().unwrap();
        assert_eq!(request.query, "shabbat");
        assert!(request.content_types.contains(&ContentType::Article));
        assert!(request.content_types.contains(&ContentType::Video));
        assert_eq!(request.categories.len(), 1);
        assert!(request.categories.contains("halacha"));
    }

    #[test]
    fn category_with_comma_stays_whole() {
        let request = SearchParams::parse(Some("category=law%2C+modern"))
            .into_request()
            .unwrap();

        assert_eq!(request.categories.len(), 1);
        assert!(request.categories.contains("law, modern"));
    }

    #[test]
    fn missing_query_string_is_unconstrained() {
        let request = SearchParams::parse(None).into_request().unwrap();
        assert_eq!(request, SearchRequest::new(""));
    }

    #[test]
    fn search_params_reject_unknown_type() {
        let params = SearchParams::parse(Some("content_type=podcast"));
        assert!(params.into_request().is_err());
    }

    #[test]
    fn new_item_requires_slug_and_title() {
        let item = NewContentItem {
            slug: "".to_string(),
            title: "Title".to_string(),
            category: None,
            published_at: None,
        };
        assert!(item.validate().is_err());

        let item = NewContentItem {
            slug: "a/b".to_string(),
            title: "Title".to_string(),
            category: None,
            published_at: None,
        };
        assert!(item.validate().is_err());
    }
}
