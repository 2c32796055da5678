use thiserror::Error;

#[derive(Error, Debug)]
pub enum TibiaWikiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Wiki API error: {0}")]
    Api(String),

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column '{column}' on table '{table}' is NOT NULL")]
    NullViolation { table: String, column: String },

    #[error("Type mismatch for column '{column}' on table '{table}': {detail}")]
    TypeMismatch {
        table: String,
        column: String,
        detail: String,
    },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Failed to parse article '{title}': {source}")]
    ArticleParsing {
        title: String,
        #[source]
        source: Box<TibiaWikiError>,
    },

    #[error("Missing required attribute '{0}'")]
    MissingAttribute(String),
}

impl TibiaWikiError {
    /// Wrap a parsing failure with the title of the article it came from.
    pub fn for_article(self, title: &str) -> Self {
        TibiaWikiError::ArticleParsing {
            title: title.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, TibiaWikiError>;
