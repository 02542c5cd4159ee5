//! Page-number pagination for list endpoints.
//!
//! List endpoints take `?page=&page_size=` and answer with a
//! [`content_feed::Page`]. Arguments are validated here once so the models
//! only ever see in-range values.
//!
//! # Usage
//!
//! ```rust,ignore
//! let validated = PageArgs { page: Some(2), page_size: None }.validate(12)?;
//! let items = ContentItemRow::find_page(content_type, &validated, pool).await?;
//! let page = Page::from_batch(items, validated.page, validated.page_size);
//! ```

use serde::Deserialize;

/// Items per page when the caller does not ask for a size.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query-string pagination arguments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageArgs {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Items per page (1-100).
    pub page_size: Option<u32>,
}

impl PageArgs {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageArgs {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Validate and apply defaults.
    pub fn validate(&self, default_page_size: u32) -> Result<ValidatedPageArgs, &'static str> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err("page must be >= 1");
        }

        // Never clamp: clients compare batch length against the size they asked for.
        let page_size = self.page_size.unwrap_or(default_page_size);
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err("page_size must be between 1 and 100");
        }

        Ok(ValidatedPageArgs { page, page_size })
    }
}

/// Validated and normalized pagination arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPageArgs {
    pub page: u32,
    pub page_size: u32,
}

impl ValidatedPageArgs {
    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }
}
