use crate::api::Article;
use crate::error::Result;
use crate::models::Spell;
use crate::parsers::{ParserContext, boolean, cleaned, integer, required_display_name, version};
use crate::wikitext::find_template;

const TEMPLATE: &str = "Infobox Spell";

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Spell>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let voc = infobox.get("voc").unwrap_or("").to_lowercase();
    let spell = Spell {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        effect: cleaned(&infobox, "effect"),
        words: cleaned(&infobox, "words"),
        spell_type: cleaned(&infobox, "type"),
        group_spell: cleaned(&infobox, "subclass"),
        group_secondary: cleaned(&infobox, "secondarygroup"),
        group_rune: cleaned(&infobox, "runegroup"),
        element: cleaned(&infobox, "damagetype"),
        mana: integer(&infobox, "mana"),
        soul: integer(&infobox, "soul"),
        cooldown: integer(&infobox, "cooldown"),
        cooldown2: integer(&infobox, "cooldown2"),
        cooldown3: integer(&infobox, "cooldown3"),
        cooldown_group: cleaned(&infobox, "cooldowngroup"),
        cooldown_group2: cleaned(&infobox, "cooldowngroup2"),
        level: integer(&infobox, "levelrequired"),
        premium: boolean(&infobox, "premium"),
        promotion: boolean(&infobox, "promotion"),
        wheel: boolean(&infobox, "wheelspell"),
        passive: boolean(&infobox, "passivespell"),
        knight: voc.contains("knight"),
        sorcerer: voc.contains("sorcerer"),
        druid: voc.contains("druid"),
        paladin: voc.contains("paladin"),
        monk: voc.contains("monk"),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(spell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn vocation_substrings_set_flags() {
        let article = Article {
            article_id: 12,
            title: "Ultimate Healing".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: "{{Infobox Spell|name=Ultimate Healing|words=exura vita|mana=160\
                |levelrequired=30|voc=[[Druid]]s and [[Elder Druid]]s|premium=no}}"
                .to_string(),
        };
        let spell = parse(&article, &ParserContext::new()).unwrap().unwrap();
        assert_eq!(spell.words.as_deref(), Some("exura vita"));
        assert_eq!(spell.level, Some(30));
        assert!(spell.druid);
        assert!(!spell.knight);
        assert!(!spell.premium);
    }
}
