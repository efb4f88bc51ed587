//! Core recipe logic — types, catalog, parsing, slot resolution, scoring, search.

pub mod catalog;
pub mod error;
pub mod finalize;
pub mod parser;
pub mod resolver;
pub mod scoring;
pub mod search;
pub mod types;
