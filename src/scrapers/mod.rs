//! Site-specific scraper implementations

pub mod dm78;
