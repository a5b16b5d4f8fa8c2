/// State management module
///
/// This module handles all persisted state, including:
/// - Database connections and queries (library.rs)
/// - Shared row structures (data.rs)

pub mod library;
pub mod data;
