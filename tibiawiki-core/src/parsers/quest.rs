use crate::api::Article;
use crate::error::Result;
use crate::models::Quest;
use crate::parsers::{ParserContext, boolean, cleaned, integer, required_display_name, version};
use crate::wikitext::{find_template, parse_links};

const TEMPLATE: &str = "Infobox Quest";

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Quest>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let quest = Quest {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        location: cleaned(&infobox, "location"),
        rookgaard: boolean(&infobox, "rookgaardquest"),
        quest_type: cleaned(&infobox, "type"),
        quest_log: boolean(&infobox, "log"),
        legend: cleaned(&infobox, "legend"),
        level_required: integer(&infobox, "lvl"),
        level_recommended: integer(&infobox, "lvlrec"),
        active_time: cleaned(&infobox, "time"),
        estimated_time: cleaned(&infobox, "timealloc"),
        premium: boolean(&infobox, "premium"),
        version: version(&infobox),
        status: context.status(&article.title),
        rewards: infobox.get("reward").map(parse_links).unwrap_or_default(),
        dangers: infobox.get("dangers").map(parse_links).unwrap_or_default(),
    };
    Ok(Some(quest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn rewards_and_dangers_are_wikilink_lists() {
        let article = Article {
            article_id: 44,
            title: "The Annihilator Quest".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: "{{Infobox Quest|name=The Annihilator Quest|lvl=100|premium=yes\
                |reward=[[Magic Sword]] or [[Stonecutter Axe]]\
                |dangers=[[Demon]]s, [[Fire Elemental (Creature)|Fire Elemental]]}}"
                .to_string(),
        };
        let quest = parse(&article, &ParserContext::new()).unwrap().unwrap();
        assert_eq!(quest.level_required, Some(100));
        assert!(quest.premium);
        assert_eq!(quest.rewards, vec!["Magic Sword", "Stonecutter Axe"]);
        assert_eq!(quest.dangers, vec!["Demon", "Fire Elemental (Creature)"]);
    }
}
