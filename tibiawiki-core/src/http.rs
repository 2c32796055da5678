//! Blocking MediaWiki API client.
//!
//! Thin `reqwest` wrapper implementing [`WikiClient`] against the wiki's
//! `api.php` endpoint. All responses use `formatversion=2`.

use crate::api::{Article, BATCH_SIZE, CategoryEntry, ImageInfo, WikiClient};
use crate::error::{Result, TibiaWikiError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_ENDPOINT: &str = "https://tibia.fandom.com/api.php";
const USER_AGENT: &str = concat!("tibiawiki-sql/", env!("CARGO_PKG_VERSION"));

pub struct HttpWikiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpWikiClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(HttpWikiClient {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        let mut request = self.client.get(&self.endpoint).query(&[
            ("format", "json"),
            ("formatversion", "2"),
            ("action", "query"),
        ]);
        request = request.query(params);
        let body: Value = request.send()?.error_for_status()?.json()?;
        if let Some(error) = body.get("error") {
            let info = error
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(TibiaWikiError::Api(info.to_string()));
        }
        Ok(body)
    }
}

fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Resolve the server-side title normalization list so responses can be
/// matched back to the titles the caller asked for.
fn normalization_map(body: &Value) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(entries) = body
        .pointer("/query/normalized")
        .and_then(Value::as_array)
    {
        for entry in entries {
            if let (Some(from), Some(to)) = (
                entry.get("from").and_then(Value::as_str),
                entry.get("to").and_then(Value::as_str),
            ) {
                map.insert(from.to_string(), to.to_string());
            }
        }
    }
    map
}

impl WikiClient for HttpWikiClient {
    fn get_category_members(&self, name: &str) -> Result<Vec<CategoryEntry>> {
        let category = format!("Category:{name}");
        let mut members = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let mut params = vec![
                ("list", "categorymembers"),
                ("cmtitle", category.as_str()),
                ("cmlimit", "500"),
                ("cmprop", "ids|title|timestamp"),
            ];
            if let Some(token) = &continuation {
                params.push(("cmcontinue", token.as_str()));
            }
            let body = self.query(&params)?;
            if let Some(entries) = body
                .pointer("/query/categorymembers")
                .and_then(Value::as_array)
            {
                for entry in entries {
                    let Some(title) = entry.get("title").and_then(Value::as_str) else {
                        continue;
                    };
                    members.push(CategoryEntry {
                        article_id: entry.get("pageid").and_then(Value::as_i64).unwrap_or(0),
                        title: title.to_string(),
                        timestamp: parse_timestamp(entry.get("timestamp")),
                    });
                }
            }
            continuation = body
                .pointer("/continue/cmcontinue")
                .and_then(Value::as_str)
                .map(str::to_string);
            if continuation.is_none() {
                break;
            }
        }
        Ok(members)
    }

    fn get_articles(&self, titles: &[String]) -> Result<Vec<Option<Article>>> {
        let mut results = Vec::with_capacity(titles.len());
        for batch in titles.chunks(BATCH_SIZE) {
            let joined = batch.join("|");
            let body = self.query(&[
                ("prop", "revisions"),
                ("rvprop", "content|timestamp"),
                ("rvslots", "main"),
                ("titles", joined.as_str()),
            ])?;
            let normalized = normalization_map(&body);
            let mut by_title: HashMap<String, Article> = HashMap::new();
            if let Some(pages) = body.pointer("/query/pages").and_then(Value::as_array) {
                for page in pages {
                    if page.get("missing").is_some() {
                        continue;
                    }
                    let Some(title) = page.get("title").and_then(Value::as_str) else {
                        continue;
                    };
                    let Some(revision) = page
                        .pointer("/revisions/0")
                        .filter(|r| !r.is_null())
                    else {
                        continue;
                    };
                    let content = revision
                        .pointer("/slots/main/content")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    by_title.insert(
                        title.to_string(),
                        Article {
                            article_id: page.get("pageid").and_then(Value::as_i64).unwrap_or(0),
                            title: title.to_string(),
                            timestamp: parse_timestamp(revision.get("timestamp")),
                            content: content.to_string(),
                        },
                    );
                }
            }
            for title in batch {
                let resolved = normalized.get(title).unwrap_or(title);
                results.push(by_title.get(resolved).cloned());
            }
        }
        Ok(results)
    }

    fn get_images_info(&self, titles: &[String]) -> Result<Vec<Option<ImageInfo>>> {
        let mut results = Vec::with_capacity(titles.len());
        for batch in titles.chunks(BATCH_SIZE) {
            let prefixed: Vec<String> = batch
                .iter()
                .map(|t| {
                    if t.starts_with("File:") {
                        t.clone()
                    } else {
                        format!("File:{t}")
                    }
                })
                .collect();
            let joined = prefixed.join("|");
            let body = self.query(&[
                ("prop", "imageinfo"),
                ("iiprop", "url|timestamp"),
                ("titles", joined.as_str()),
            ])?;
            let normalized = normalization_map(&body);
            let mut by_title: HashMap<String, ImageInfo> = HashMap::new();
            if let Some(pages) = body.pointer("/query/pages").and_then(Value::as_array) {
                for page in pages {
                    if page.get("missing").is_some() {
                        continue;
                    }
                    let Some(title) = page.get("title").and_then(Value::as_str) else {
                        continue;
                    };
                    let Some(info) = page.pointer("/imageinfo/0").filter(|i| !i.is_null()) else {
                        continue;
                    };
                    let Some(url) = info.get("url").and_then(Value::as_str) else {
                        continue;
                    };
                    let file_name = title.strip_prefix("File:").unwrap_or(title);
                    by_title.insert(
                        title.to_string(),
                        ImageInfo {
                            article_id: page.get("pageid").and_then(Value::as_i64).unwrap_or(0),
                            file_name: file_name.to_string(),
                            timestamp: parse_timestamp(info.get("timestamp")),
                            url: url.to_string(),
                        },
                    );
                }
            }
            for title in &prefixed {
                let resolved = normalized.get(title).unwrap_or(title);
                results.push(by_title.get(resolved).cloned());
            }
        }
        Ok(results)
    }

    fn download_image(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}
