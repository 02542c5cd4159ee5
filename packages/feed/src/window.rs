//! Abbreviated page-number navigation.
//!
//! Produces the sequence of page links shown under a paginated list, e.g.
//! `1 … 4 5 6 … 10`. Pure functions, no IO.

use serde::{Serialize, Serializer};

/// Pages shown in full before the control starts abbreviating.
pub const MAX_PAGES_TO_SHOW: u32 = 5;

/// One slot of the navigation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Ellipsis,
}

/// Serialized as the bare page number, or `"…"` for the gap marker.
impl Serialize for PageSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageSlot::Page(n) => serializer.serialize_u32(*n),
            PageSlot::Ellipsis => serializer.serialize_str("…"),
        }
    }
}

/// Whether the navigation control should be rendered at all.
pub fn should_render(total_pages: u32) -> bool {
    total_pages > 1
}

/// Compute the page slots for `current_page` out of `total_pages`.
///
/// `current_page` must lie in `1..=total_pages`; out-of-range values are a
/// caller bug and get clamped in release builds.
pub fn resolve(current_page: u32, total_pages: u32) -> Vec<PageSlot> {
    if total_pages <= MAX_PAGES_TO_SHOW {
        return (1..=total_pages).map(PageSlot::Page).collect();
    }

    debug_assert!(
        (1..=total_pages).contains(&current_page),
        "current page {} outside 1..={}",
        current_page,
        total_pages
    );
    let current = current_page.clamp(1, total_pages);

    let mut start = current.saturating_sub(1).max(2);
    let mut end = (current + 1).min(total_pages - 1);
    if current <= 3 {
        end = (total_pages - 1).min(4);
    }
    if current >= total_pages - 2 {
        start = (total_pages - 3).max(2);
    }

    let mut slots = Vec::with_capacity(MAX_PAGES_TO_SHOW as usize + 2);
    slots.push(PageSlot::Page(1));
    if start > 2 {
        slots.push(PageSlot::Ellipsis);
    }
    slots.extend((start..=end).map(PageSlot::Page));
    if end < total_pages - 1 {
        slots.push(PageSlot::Ellipsis);
    }
    slots.push(PageSlot::Page(total_pages));
    slots
}
