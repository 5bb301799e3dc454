//! Public entry points: the HTTP page served to the single interactive user.

pub mod http;
pub mod page;

pub use http::{router, serve, AppState};
