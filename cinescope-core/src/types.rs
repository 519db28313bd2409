use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogError, Result};

/// Highest page number the upstream provider will serve.
pub const MAX_PAGE: u32 = 500;

/// Items per page, both natively and for re-paginated results.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment used by the upstream API.
    pub fn path_segment(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// Field carrying the release (movies) or first air (tv) date.
    pub fn date_field(self) -> &'static str {
        match self {
            MediaKind::Movie => "release_date",
            MediaKind::Tv => "first_air_date",
        }
    }

    pub fn as_str(self) -> &'static str {
        self.path_segment()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingEndpoint {
    Popular,
    TopRated,
    Upcoming,
    OnTheAir,
}

impl ListingEndpoint {
    pub fn path_segment(self) -> &'static str {
        match self {
            ListingEndpoint::Popular => "popular",
            ListingEndpoint::TopRated => "top_rated",
            ListingEndpoint::Upcoming => "upcoming",
            ListingEndpoint::OnTheAir => "on_the_air",
        }
    }
}

impl fmt::Display for ListingEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// One page of listing results in the upstream wire shape.
///
/// Items are kept verbatim so callers receive every field the provider
/// returned; filtering works on an [`ItemSummary`] read from each item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(default)]
    pub results: Vec<Value>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

impl ListingPage {
    pub fn empty(page: u32) -> Self {
        Self {
            results: Vec::new(),
            page,
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// The minimal view of a listing item needed for client-side filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: i64,
    pub genre_ids: Vec<i64>,
    pub release_date: Option<String>,
}

impl ItemSummary {
    /// Read the filterable fields out of a raw item. Returns `None` when the
    /// item is not an object or carries no numeric id.
    pub fn from_value(item: &Value) -> Option<Self> {
        let object = item.as_object()?;
        let id = object.get("id")?.as_i64()?;

        let genre_ids = match object.get("genre_ids").and_then(Value::as_array) {
            Some(ids) => ids.iter().filter_map(Value::as_i64).collect(),
            None => object
                .get("genres")
                .and_then(Value::as_array)
                .map(|genres| {
                    genres
                        .iter()
                        .filter_map(|genre| genre.get("id").and_then(Value::as_i64))
                        .collect()
                })
                .unwrap_or_default(),
        };

        let release_date = ["release_date", "first_air_date"]
            .iter()
            .find_map(|field| object.get(*field).and_then(Value::as_str))
            .map(str::to_owned);

        Some(Self {
            id,
            genre_ids,
            release_date,
        })
    }
}

/// A four digit release year used as a prefix match on item dates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Year(String);

impl Year {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(CatalogError::Validation(format!(
                "year must be a four digit number, got '{raw}'"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filters the upstream listing endpoints cannot apply themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub genre_id: Option<i64>,
    pub year: Option<Year>,
}

impl FilterSpec {
    pub fn new(genre_id: Option<i64>, year: Option<Year>) -> Self {
        Self { genre_id, year }
    }

    /// Build a spec from raw query values. Blank values count as absent.
    pub fn parse(genre: Option<&str>, year: Option<&str>) -> Result<Self> {
        let genre_id = match genre.map(str::trim).filter(|g| !g.is_empty()) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                CatalogError::Validation(format!("genre id must be an integer, got '{raw}'"))
            })?),
            None => None,
        };

        let year = match year.map(str::trim).filter(|y| !y.is_empty()) {
            Some(raw) => Some(Year::parse(raw)?),
            None => None,
        };

        Ok(Self { genre_id, year })
    }

    /// True when neither filter is set and the native pagination applies.
    pub fn is_empty(&self) -> bool {
        self.genre_id.is_none() && self.year.is_none()
    }

    pub fn matches(&self, item: &ItemSummary) -> bool {
        let genre_ok = self
            .genre_id
            .is_none_or(|genre| item.genre_ids.contains(&genre));

        let year_ok = self.year.as_ref().is_none_or(|year| {
            item.release_date
                .as_deref()
                .is_some_and(|date| date.starts_with(year.as_str()))
        });

        genre_ok && year_ok
    }

    /// Apply the predicate to a raw item. Malformed items never match.
    pub fn matches_value(&self, item: &Value) -> bool {
        ItemSummary::from_value(item).is_some_and(|summary| self.matches(&summary))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Clamp a requested page into `[1, MAX_PAGE]`. Out-of-range values are
/// never rejected.
pub fn clamp_page(requested: i64) -> u32 {
    let clamped = requested.clamp(1, i64::from(MAX_PAGE));
    if clamped != requested {
        warn!(
            requested,
            clamped, "requested page out of bounds, using clamped page instead"
        );
    }
    clamped as u32
}

/// Parse a page query value leniently: missing, blank, or non-numeric input
/// is page 1.
pub fn parse_page(raw: Option<&str>) -> u32 {
    let requested = raw
        .map(str::trim)
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(1);
    clamp_page(requested)
}
