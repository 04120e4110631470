//! Request extractors shared by route handlers.

pub mod actor;

pub use actor::Actor;
