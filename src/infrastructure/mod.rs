//! Infrastructure layer - cache, upstream sources, persistence

pub mod cache;
pub mod market;
pub mod persistence;
