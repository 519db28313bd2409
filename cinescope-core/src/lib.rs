//! # Cinescope Core
//!
//! Core library for the Cinescope API: browsing movies and TV shows on top of
//! the TMDB v3 API.
//!
//! ## Overview
//!
//! - **Filtered listings**: TMDB's listing endpoints cannot filter by genre
//!   and year together, so [`aggregator`] scans native pages, filters
//!   client-side, and re-paginates the matches.
//! - **Detail caching**: [`freshness`] keeps refreshed detail payloads for 24
//!   hours in a [`storage`] backend (PostgreSQL or in-memory).
//! - **Catalog**: [`catalog::CatalogService`] ties both to the TMDB
//!   [`providers`] and exposes the operations the HTTP layer calls.
//!
//! ## Feature Flags
//!
//! - `database`: enables the PostgreSQL detail cache and [`MIGRATOR`].

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregator;
pub mod catalog;
pub mod error;
pub mod freshness;
pub mod providers;
pub mod storage;
pub mod types;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use catalog::CatalogService;
pub use error::{CatalogError, Result};
pub use freshness::{CachedDetail, DetailKey, DetailProjection, FreshnessCache};
pub use providers::{ProviderError, TmdbApiProvider, TmdbSettings};
pub use types::{FilterSpec, Genre, ListingEndpoint, ListingPage, MediaKind, Year};
