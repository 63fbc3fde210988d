//! HTTP clients for the hosted services podsee relies on.
//!
//! - `MapsClient`: Google Maps geocoding, place autocomplete and details
//! - `IpLocator`: approximate device location from the public IP
//! - `CommentClient`: Supabase (PostgREST) discussion and moderation

pub mod comments;
pub mod error;
pub mod locator;
pub mod maps;

pub use comments::{CommentClient, CommentError, COMMENTS_PAGE_SIZE, REPLY_PREVIEW_SIZE};
pub use error::ApiError;
pub use locator::{IpLocator, LocationError};
pub use maps::{GeocodeError, GeocodeResult, MapsClient};
