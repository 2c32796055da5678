//! Core library for turning TibiaWiki articles into a SQLite database.

pub mod api;
pub mod error;
pub mod http;
pub mod images;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod schema;
pub mod wikitext;

pub use error::{Result, TibiaWikiError};
pub use pipeline::{GenerationOptions, Pipeline};
