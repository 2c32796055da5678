use crate::api::Article;
use crate::error::Result;
use crate::models::{Outfit, OutfitQuest};
use crate::parsers::{ParserContext, boolean, cleaned, integer, required_display_name, version};
use crate::wikitext::{find_template, parse_links};

const TEMPLATE: &str = "Infobox Outfit";

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Outfit>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let mut quests = Vec::new();
    for (field, quest_type) in [("outfit", "outfit"), ("addons", "addon")] {
        if let Some(value) = infobox.get(field) {
            quests.extend(parse_links(value).into_iter().map(|quest_title| OutfitQuest {
                quest_title,
                quest_type: quest_type.to_string(),
            }));
        }
    }

    let outfit = Outfit {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        outfit_type: cleaned(&infobox, "primarytype"),
        premium: boolean(&infobox, "premium"),
        tournament: boolean(&infobox, "tournament"),
        bought: boolean(&infobox, "bought"),
        full_price: integer(&infobox, "fulloutfitprice"),
        achievement: cleaned(&infobox, "achievement"),
        version: version(&infobox),
        status: context.status(&article.title),
        quests,
    };
    Ok(Some(outfit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn quest_lists_carry_type_discriminator() {
        let article = Article {
            article_id: 55,
            title: "Druid Outfits".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: "{{Infobox Outfit|name=Druid|primarytype=Basic|premium=no\
                |outfit=[[Druid Outfits Quest]]\
                |addons=[[Druid Addon Quest]] and [[Second Addon Quest]]}}"
                .to_string(),
        };
        let outfit = parse(&article, &ParserContext::new()).unwrap().unwrap();
        assert_eq!(outfit.quests.len(), 3);
        assert_eq!(outfit.quests[0].quest_type, "outfit");
        assert_eq!(outfit.quests[1].quest_type, "addon");
        assert_eq!(outfit.quests[2].quest_title, "Second Addon Quest");
    }
}
