// src/parser/mod.rs

//! Pure parsing of listing URLs into structured records.

mod slug;
mod states;

pub use slug::parse_listing_url;
