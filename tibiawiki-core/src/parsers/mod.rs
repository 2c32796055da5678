//! Article parsers: one per entity kind.
//!
//! Each parser looks for its infobox template in the article content and
//! maps template parameters onto a typed model. A missing infobox yields
//! `Ok(None)` so the caller can count the article as unparsed without
//! treating it as a failure; a malformed required field is a typed error
//! wrapped with the article title.

use crate::error::{Result, TibiaWikiError};
use crate::wikitext::{self, Template};
use std::collections::HashSet;

pub mod achievement;
pub mod creature;
pub mod house;
pub mod imbuement;
pub mod item;
pub mod misc;
pub mod npc;
pub mod outfit;
pub mod quest;
pub mod spell;

/// Shared parse-time state: the set of deprecated article titles collected
/// before parsing starts.
#[derive(Debug, Default)]
pub struct ParserContext {
    pub deprecated: HashSet<String>,
}

impl ParserContext {
    pub fn new() -> Self {
        ParserContext::default()
    }

    /// `deprecated` when the title was listed in the Deprecated category at
    /// ingest, `active` otherwise.
    pub fn status(&self, title: &str) -> String {
        if self.deprecated.contains(title) {
            "deprecated".to_string()
        } else {
            "active".to_string()
        }
    }
}

/// Read a required template parameter; absence is a typed error.
pub(crate) fn required<'a>(template: &'a Template, key: &str) -> Result<&'a str> {
    template
        .get(key)
        .ok_or_else(|| TibiaWikiError::MissingAttribute(key.to_string()))
}

pub(crate) fn text(template: &Template, key: &str) -> Option<String> {
    template.get(key).map(str::to_string)
}

/// Parameter value with wiki markup stripped.
pub(crate) fn cleaned(template: &Template, key: &str) -> Option<String> {
    template
        .get(key)
        .map(|v| wikitext::clean_links(v, false))
        .filter(|v| !v.is_empty())
}

pub(crate) fn integer(template: &Template, key: &str) -> Option<i64> {
    template.get(key).map(|v| wikitext::parse_integer(v, 0))
}

pub(crate) fn boolean(template: &Template, key: &str) -> bool {
    template
        .get(key)
        .map(|v| wikitext::parse_boolean(v, false, false))
        .unwrap_or(false)
}

/// The in-game display name: `actualname` preferred, `name` as fallback.
/// The page title is never used here; callers that need a display string
/// fall back to the title themselves.
pub(crate) fn display_name(template: &Template) -> Option<String> {
    template
        .get("actualname")
        .or_else(|| template.get("name"))
        .map(|v| wikitext::clean_links(v, false))
        .filter(|v| !v.is_empty())
}

/// Like [`display_name`], but absence of both fields is a typed error.
/// Entities whose infobox always carries a name go through this.
pub(crate) fn required_display_name(template: &Template) -> Result<String> {
    if let Some(name) = display_name(template) {
        return Ok(name);
    }
    required(template, "name").map(str::to_string)
}

/// Client version the entity was implemented in.
pub(crate) fn version(template: &Template) -> Option<String> {
    cleaned(template, "implemented")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TibiaWikiError;
    use crate::wikitext::find_template;

    #[test]
    fn required_name_raises_when_absent() {
        let template = find_template("{{Infobox Creature|hp=100}}", "Infobox Creature", false)
            .unwrap();
        let err = required_display_name(&template).unwrap_err();
        assert!(matches!(err, TibiaWikiError::MissingAttribute(_)));
    }

    #[test]
    fn actualname_is_preferred_over_name() {
        let template = find_template(
            "{{Infobox Object|name=Magic Sword|actualname=magic sword}}",
            "Infobox Object",
            false,
        )
        .unwrap();
        assert_eq!(required_display_name(&template).unwrap(), "magic sword");
    }
}
