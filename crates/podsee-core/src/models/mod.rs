//! Data models for podsee entities.
//!
//! - `Centre`, `Offering`: tuition centres and the classes they teach
//! - `CentreRow`, `OfferingRow`: raw spreadsheet rows
//! - `Comment`: discussion entries stored in Supabase
//! - `Coordinates`, `UserLocation`, `PlacePrediction`: location types

pub mod centre;
pub mod comment;
pub mod location;

pub use centre::{Centre, CentreRow, Offering, OfferingRow};
pub use comment::{Comment, NewComment};
pub use location::{Coordinates, LocationSource, PlacePrediction, UserLocation};
