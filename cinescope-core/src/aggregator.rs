//! Multi-page fetch and re-pagination for listing requests carrying filters
//! the upstream listing endpoints cannot apply themselves.
//!
//! Filtered totals are bounded by the scan limits in [`ScanPolicy`]: they
//! count the matches found within the scanned pages, not every match the
//! provider holds. The unfiltered path returns the provider's own totals.

use std::future::Future;

use serde_json::Value;
use tracing::debug;

use crate::{
    providers::ProviderError,
    types::{FilterSpec, ListingEndpoint, ListingPage, MAX_PAGE, MediaKind, PAGE_SIZE, clamp_page},
};

/// Limits applied while scanning upstream pages for filter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Upper bound on native pages fetched for one request.
    pub max_pages: u32,
    /// Stop scanning once this many matches have been collected.
    pub result_cap: Option<usize>,
    /// Size of each re-paginated page.
    pub page_size: usize,
}

impl ScanPolicy {
    pub const fn new(max_pages: u32, result_cap: Option<usize>) -> Self {
        Self {
            max_pages,
            result_cap,
            page_size: PAGE_SIZE,
        }
    }

    pub fn for_listing(kind: MediaKind, endpoint: ListingEndpoint) -> Self {
        match (kind, endpoint) {
            (MediaKind::Movie, ListingEndpoint::Popular) => Self::new(25, Some(500)),
            (MediaKind::Movie, _) => Self::new(5, None),
            (MediaKind::Tv, _) => Self::new(5, Some(100)),
        }
    }
}

/// Produce one page of a listing, filtering client-side when `filter` is set.
///
/// With an empty filter the native page for the (clamped) requested page is
/// returned as-is, apart from `total_pages` being capped at [`MAX_PAGE`].
/// Otherwise native pages are scanned from page 1 until the provider runs out
/// of pages, the result cap is reached, or `policy.max_pages` pages have been
/// read; the collected matches are then re-sliced into `policy.page_size`
/// windows. Any upstream failure aborts the whole request.
pub async fn fetch_filtered_page<F, Fut>(
    mut fetch_page: F,
    requested_page: i64,
    filter: &FilterSpec,
    policy: ScanPolicy,
) -> Result<ListingPage, ProviderError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<ListingPage, ProviderError>>,
{
    let page = clamp_page(requested_page);

    if filter.is_empty() {
        let mut native = fetch_page(page).await?;
        native.total_pages = native.total_pages.min(MAX_PAGE);
        return Ok(native);
    }

    let mut matches: Vec<Value> = Vec::new();
    let mut scanned = 0u32;
    let mut native_page = 1u32;

    loop {
        let response = fetch_page(native_page).await?;
        scanned += 1;

        let before = matches.len();
        matches.extend(
            response
                .results
                .into_iter()
                .filter(|item| filter.matches_value(item)),
        );
        debug!(
            native_page,
            total_pages = response.total_pages,
            matched = matches.len() - before,
            accumulated = matches.len(),
            "scanned upstream page"
        );

        if let Some(cap) = policy.result_cap
            && matches.len() >= cap
        {
            matches.truncate(cap);
            break;
        }

        if native_page >= response.total_pages || scanned >= policy.max_pages {
            break;
        }
        native_page += 1;
    }

    Ok(repaginate(matches, page, policy.page_size))
}

fn repaginate(matches: Vec<Value>, page: u32, page_size: usize) -> ListingPage {
    let page_size = page_size.max(1);
    let total = matches.len();
    let start = (page as usize - 1).saturating_mul(page_size);

    let results = if start >= total {
        Vec::new()
    } else {
        matches.into_iter().skip(start).take(page_size).collect()
    };

    ListingPage {
        results,
        page,
        total_pages: u32::try_from(total.div_ceil(page_size)).unwrap_or(u32::MAX),
        total_results: total as u64,
    }
}
