pub mod admin;
pub mod discussion;
pub mod results;
pub mod search;
