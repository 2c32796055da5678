//! The surface the pipeline expects from the wiki.
//!
//! The generator itself never talks HTTP; it drives a [`WikiClient`].
//! Batched calls keep positional correspondence with their input titles by
//! yielding `None` placeholders for missing pages.

use crate::error::Result;
use chrono::{DateTime, Utc};

/// Maximum number of titles per batched request.
pub const BATCH_SIZE: usize = 50;

/// One entry of a category listing.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEntry {
    pub article_id: i64,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

/// One article with its latest revision content.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub article_id: i64,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

/// Metadata for one uploaded file. `file_name` is the page title with the
/// `File:` prefix stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub article_id: i64,
    pub file_name: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
}

pub trait WikiClient {
    /// List all members of a category, following pagination continuation
    /// tokens transparently.
    fn get_category_members(&self, name: &str) -> Result<Vec<CategoryEntry>>;

    /// Fetch articles in batches of at most [`BATCH_SIZE`]. The result has
    /// one entry per requested title, `None` where the page is missing.
    fn get_articles(&self, titles: &[String]) -> Result<Vec<Option<Article>>>;

    fn get_article(&self, title: &str) -> Result<Option<Article>> {
        Ok(self
            .get_articles(&[title.to_string()])?
            .into_iter()
            .next()
            .flatten())
    }

    /// Fetch file metadata with the same batching and `None` semantics as
    /// [`WikiClient::get_articles`].
    fn get_images_info(&self, titles: &[String]) -> Result<Vec<Option<ImageInfo>>>;

    fn get_image_info(&self, title: &str) -> Result<Option<ImageInfo>> {
        Ok(self
            .get_images_info(&[title.to_string()])?
            .into_iter()
            .next()
            .flatten())
    }

    /// Download the binary content behind an image URL.
    fn download_image(&self, url: &str) -> Result<Vec<u8>>;
}
