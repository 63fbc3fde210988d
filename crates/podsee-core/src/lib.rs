//! Core library for podsee.
//!
//! Provides everything the front ends need to find tuition centres:
//!
//! - `catalog`: spreadsheet loading, level/subject normalization and filtering
//! - `geo`: great-circle distance and distance ordering
//! - `cache`: on-disk caches (geocoded centres, saved user location)
//! - `location`: centre geocoding with caching and progressive distance resolution
//! - `api`: Google Maps, IP locator and Supabase comment clients
//! - `content`: comment sanitization and validation rules
//! - `admin`, `auth`: moderation access and keychain-backed secrets
//! - `config`: application settings and service credentials

pub mod admin;
pub mod api;
pub mod auth;
pub mod cache;
pub mod catalog;
pub mod centre_id;
pub mod config;
pub mod content;
pub mod geo;
pub mod location;
pub mod models;
pub mod utils;

pub use catalog::Catalog;
pub use config::{Config, ServiceConfig};
pub use location::LocationService;
pub use models::{Centre, Comment, Coordinates, Offering, PlacePrediction, UserLocation};
