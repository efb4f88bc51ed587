//! recipe-beam — recipe search over a food catalog.
//!
//! Fills an ordered template of slot types with catalog items, combining
//! their stat vectors with a pair penalty, and keeps the best partial
//! recipes in a bounded beam. Final results are clamped, filtered and ranked.

pub mod cli;
pub mod core;
pub mod history;
pub mod logging;
