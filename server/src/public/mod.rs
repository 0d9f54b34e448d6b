//! Unauthenticated surface: the root page and the open data endpoint.

pub mod data;
pub mod landing;
