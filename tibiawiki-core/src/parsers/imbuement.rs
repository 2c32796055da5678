//! Imbuement articles. The effect text is derived from an
//! `Effect/<Category>|<Amount>` template through a fixed dictionary.

use crate::api::Article;
use crate::error::Result;
use crate::models::{Imbuement, ImbuementMaterial};
use crate::parsers::{ParserContext, cleaned, required_display_name, version};
use crate::wikitext::{clean_links, find_template, parse_integer, parse_templates_nested};

const TEMPLATE: &str = "Infobox Imbuement";

/// Effect category to display pattern; `{}` takes the template's amount.
const EFFECT_PATTERNS: [(&str, &str); 23] = [
    ("Bash", "Club fighting +{}"),
    ("Chop", "Axe fighting +{}"),
    ("Slash", "Sword fighting +{}"),
    ("Precision", "Distance fighting +{}"),
    ("Blockade", "Shielding +{}"),
    ("Epiphany", "Magic level +{}"),
    ("Scorch", "Fire damage {}"),
    ("Venom", "Earth damage {}"),
    ("Frost", "Ice damage {}"),
    ("Electrify", "Energy damage {}"),
    ("Reap", "Death damage {}"),
    ("Vampirism", "Life leech {}"),
    ("Void", "Mana leech {}"),
    ("Strike", "Critical extra damage {}"),
    ("Lich Shroud", "Death protection {}"),
    ("Snake Skin", "Earth protection {}"),
    ("Quara Scale", "Ice protection {}"),
    ("Dragon Hide", "Fire protection {}"),
    ("Cloud Fabric", "Energy protection {}"),
    ("Demon Presence", "Holy protection {}"),
    ("Swiftness", "Speed +{}"),
    ("Featherweight", "Capacity +{}"),
    ("Vibrancy", "Paralysis removal chance {}"),
];

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Imbuement>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let imbuement = Imbuement {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        tier: cleaned(&infobox, "prefix"),
        imbuement_type: cleaned(&infobox, "type"),
        category: cleaned(&infobox, "category"),
        effect: infobox.get("effect").and_then(parse_effect),
        slots: cleaned(&infobox, "slots"),
        version: version(&infobox),
        status: context.status(&article.title),
        materials: infobox
            .get("astralsources")
            .map(parse_materials)
            .unwrap_or_default(),
    };
    Ok(Some(imbuement))
}

/// `{{Effect/Bash|2}}` becomes `"Club fighting +2"`. Unknown categories
/// fall back to `"<category> <amount>"` so new wiki effects still surface.
fn parse_effect(field: &str) -> Option<String> {
    let template = parse_templates_nested(field)
        .into_iter()
        .find(|t| t.name.starts_with("Effect/"))?;
    let category = template.name.strip_prefix("Effect/")?.trim().to_string();
    let amount = template
        .positional()
        .first()
        .map(|v| clean_links(v, false))
        .unwrap_or_default();
    let effect = EFFECT_PATTERNS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, pattern)| pattern.replace("{}", &amount))
        .unwrap_or_else(|| format!("{category} {amount}").trim().to_string());
    Some(effect)
}

/// `astralsources` is a comma-separated list of `item: amount` pairs.
fn parse_materials(field: &str) -> Vec<ImbuementMaterial> {
    field
        .split(',')
        .filter_map(|pair| {
            let (item, amount) = pair.split_once(':')?;
            let item = clean_links(item, false);
            if item.is_empty() {
                return None;
            }
            Some(ImbuementMaterial {
                item_title: item,
                amount: parse_integer(amount, 1),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn effect_dictionary_and_materials() {
        let article = Article {
            article_id: 61,
            title: "Basic Bash".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: "{{Infobox Imbuement|name=Basic Bash|prefix=Basic|type=Bash\
                |category=Skills|effect={{Effect/Bash|2}}\
                |astralsources=[[Cultish Robe]]: 20, [[Cyclops Toe]]: 15}}"
                .to_string(),
        };
        let imbuement = parse(&article, &ParserContext::new()).unwrap().unwrap();
        assert_eq!(imbuement.effect.as_deref(), Some("Club fighting +2"));
        assert_eq!(imbuement.tier.as_deref(), Some("Basic"));
        assert_eq!(
            imbuement.materials,
            vec![
                ImbuementMaterial {
                    item_title: "Cultish Robe".into(),
                    amount: 20
                },
                ImbuementMaterial {
                    item_title: "Cyclops Toe".into(),
                    amount: 15
                },
            ]
        );
    }

    #[test]
    fn unknown_effect_category_falls_back_to_raw() {
        assert_eq!(
            parse_effect("{{Effect/Mystery|5%}}").as_deref(),
            Some("Mystery 5%")
        );
        assert_eq!(parse_effect("no template here"), None);
    }
}
