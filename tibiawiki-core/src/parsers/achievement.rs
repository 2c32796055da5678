use crate::api::Article;
use crate::error::Result;
use crate::models::Achievement;
use crate::parsers::{ParserContext, boolean, cleaned, integer, required_display_name, version};
use crate::wikitext::{clean_links, find_template};

const TEMPLATE: &str = "Infobox Achievement";

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Achievement>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let achievement = Achievement {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        grade: integer(&infobox, "grade"),
        points: integer(&infobox, "points"),
        description: cleaned(&infobox, "description"),
        spoiler: infobox
            .get("spoiler")
            .map(|v| clean_links(v, true))
            .filter(|v| !v.is_empty()),
        secret: boolean(&infobox, "secret"),
        premium: boolean(&infobox, "premium"),
        achievement_id: integer(&infobox, "achievementid"),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(achievement))
}
