//! Creature articles: base infobox mapping plus the loot, ability,
//! max-damage and sound child collections.

use crate::api::Article;
use crate::error::Result;
use crate::models::{Creature, CreatureAbility, CreatureDrop, CreatureMaxDamage};
use crate::parsers::{ParserContext, boolean, cleaned, integer, required_display_name, text, version};
use crate::wikitext::{
    self, clean_links, find_template, find_templates, parse_maximum_integer, parse_min_max,
    parse_sounds,
};

const TEMPLATE: &str = "Infobox Creature";

/// Damage element fields of the `Max Damage` template, in source order.
/// `manadrain` and `summons` are listed but excluded from the total.
const DAMAGE_ELEMENTS: [&str; 11] = [
    "physical",
    "earth",
    "fire",
    "ice",
    "energy",
    "death",
    "holy",
    "drown",
    "lifedrain",
    "manadrain",
    "summons",
];

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Creature>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let creature = Creature {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        article: text(&infobox, "article"),
        plural: cleaned(&infobox, "plural"),
        library_race: cleaned(&infobox, "race_id"),
        creature_class: cleaned(&infobox, "creatureclass"),
        type_primary: cleaned(&infobox, "primarytype"),
        type_secondary: cleaned(&infobox, "secondarytype"),
        bestiary_class: cleaned(&infobox, "bestiaryclass"),
        bestiary_level: cleaned(&infobox, "bestiarylevel"),
        bestiary_occurrence: cleaned(&infobox, "occurrence"),
        hitpoints: integer(&infobox, "hp"),
        experience: integer(&infobox, "exp"),
        armor: integer(&infobox, "armor"),
        mitigation: integer(&infobox, "mitigation"),
        speed: integer(&infobox, "speed"),
        runs_at: integer(&infobox, "runsat"),
        summon_cost: integer(&infobox, "summon"),
        convince_cost: integer(&infobox, "convince"),
        illusionable: boolean(&infobox, "illusionable"),
        pushable: boolean(&infobox, "pushable"),
        push_objects: boolean(&infobox, "pushobjects"),
        sees_invisible: boolean(&infobox, "senseinvis"),
        paralysable: boolean(&infobox, "paralysable"),
        boss: boolean(&infobox, "isboss"),
        modifier_physical: integer(&infobox, "physicalDmgMod"),
        modifier_earth: integer(&infobox, "earthDmgMod"),
        modifier_fire: integer(&infobox, "fireDmgMod"),
        modifier_ice: integer(&infobox, "iceDmgMod"),
        modifier_energy: integer(&infobox, "energyDmgMod"),
        modifier_death: integer(&infobox, "deathDmgMod"),
        modifier_holy: integer(&infobox, "holyDmgMod"),
        modifier_drown: integer(&infobox, "drownDmgMod"),
        modifier_lifedrain: integer(&infobox, "hpDrainDmgMod"),
        modifier_healing: integer(&infobox, "healMod"),
        walks_through: cleaned(&infobox, "walksthrough"),
        walks_around: cleaned(&infobox, "walksaround"),
        location: cleaned(&infobox, "location"),
        version: version(&infobox),
        status: context.status(&article.title),
        loot: infobox.get("loot").map(parse_loot).unwrap_or_default(),
        abilities: infobox
            .get("abilities")
            .map(parse_abilities)
            .unwrap_or_default(),
        max_damage: infobox.get("maxdmg").and_then(parse_max_damage),
        sounds: infobox
            .get("sounds")
            .map(parse_sounds)
            .unwrap_or_default(),
    };
    Ok(Some(creature))
}

/// Every `Loot Item` entry: `{{Loot Item|1-80|Gold Coin}}` or
/// `{{Loot Item|Gold Coin}}`. A missing amount means "0 to 1".
fn parse_loot(text: &str) -> Vec<CreatureDrop> {
    find_templates(text, "Loot Item", false)
        .into_iter()
        .filter_map(|t| {
            let positional = t.positional();
            let (range, item) = match positional.as_slice() {
                [item] => (None, *item),
                [range, item, ..] => (Some(*range), *item),
                [] => return None,
            };
            let (min, max) = range.map(parse_min_max).unwrap_or((0, 1));
            Some(CreatureDrop {
                item_title: clean_links(item, false),
                min,
                max,
            })
        })
        .collect()
}

/// The `abilities` field. With an `Ability List` wrapper every positional
/// entry yields one record: known sub-templates map to `{name, effect,
/// element}` and bare text becomes a `plain_text` record. Without the
/// wrapper the whole field collapses into a single `no_template` record.
pub fn parse_abilities(field: &str) -> Vec<CreatureAbility> {
    let Some(list) = find_template(field, "Ability List", false) else {
        let content = clean_links(field, false);
        if content.is_empty() {
            return Vec::new();
        }
        return vec![CreatureAbility {
            name: content,
            effect: String::new(),
            element: "no_template".to_string(),
        }];
    };

    list.positional()
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            if !entry.starts_with("{{") {
                return Some(CreatureAbility {
                    name: clean_links(entry, false),
                    effect: String::new(),
                    element: "plain_text".to_string(),
                });
            }
            let template = wikitext::parse_templates(entry).into_iter().next()?;
            let positional = template.positional();
            let ability = match template.name.as_str() {
                "Melee" => CreatureAbility {
                    name: "Melee".to_string(),
                    effect: positional.first().copied().unwrap_or("").to_string(),
                    element: "physical".to_string(),
                },
                "Summon" => CreatureAbility {
                    name: "Summon".to_string(),
                    effect: positional.join(", "),
                    element: "summon".to_string(),
                },
                "Healing" => CreatureAbility {
                    name: "Self-Healing".to_string(),
                    effect: positional.first().copied().unwrap_or("").to_string(),
                    element: "healing".to_string(),
                },
                _ => CreatureAbility {
                    name: clean_links(positional.first().copied().unwrap_or(""), false),
                    effect: positional.get(1).copied().unwrap_or("").to_string(),
                    element: positional.get(2).copied().unwrap_or("").to_string(),
                },
            };
            Some(ability)
        })
        .collect()
}

/// The `maxdmg` field. With a `Max Damage` template the per-element figures
/// are read and summed (summons and manadrain excluded); otherwise the
/// largest integer in the raw text stands in as the total. Fields like
/// `"Unknown."` yield nothing.
pub fn parse_max_damage(field: &str) -> Option<CreatureMaxDamage> {
    if let Some(template) = find_template(field, "Max Damage", false) {
        let value = |key: &str| {
            template
                .get(key)
                .map(|v| wikitext::parse_integer(v, 0))
        };
        let mut damage = CreatureMaxDamage::default();
        for element in DAMAGE_ELEMENTS {
            let parsed = value(element);
            match element {
                "physical" => damage.physical = parsed,
                "earth" => damage.earth = parsed,
                "fire" => damage.fire = parsed,
                "ice" => damage.ice = parsed,
                "energy" => damage.energy = parsed,
                "death" => damage.death = parsed,
                "holy" => damage.holy = parsed,
                "drown" => damage.drown = parsed,
                "lifedrain" => damage.lifedrain = parsed,
                "manadrain" => damage.manadrain = parsed,
                "summons" => damage.summons = parsed,
                _ => unreachable!(),
            }
            if !matches!(element, "manadrain" | "summons") {
                damage.total += parsed.unwrap_or(0);
            }
        }
        return Some(damage);
    }
    parse_maximum_integer(field).map(|total| CreatureMaxDamage {
        total,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(content: &str) -> Article {
        Article {
            article_id: 77,
            title: "Dragon".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: content.to_string(),
        }
    }

    #[test]
    fn missing_infobox_yields_none() {
        let context = ParserContext::new();
        let parsed = parse(&article("just prose, no infobox"), &context).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn base_fields_and_loot() {
        let content = "{{Infobox Creature|name=Dragon|hp=1000|exp=700|isboss=no\
            |loot={{Loot Item|1-80|Gold Coin}}{{Loot Item|Dragon Ham}}\
            |sounds={{Sound List|GROAAR}}}}";
        let context = ParserContext::new();
        let creature = parse(&article(content), &context).unwrap().unwrap();
        assert_eq!(creature.article_id, 77);
        assert_eq!(creature.title, "Dragon");
        assert_eq!(creature.hitpoints, Some(1000));
        assert!(!creature.boss);
        assert_eq!(
            creature.loot,
            vec![
                CreatureDrop {
                    item_title: "Gold Coin".into(),
                    min: 1,
                    max: 80
                },
                CreatureDrop {
                    item_title: "Dragon Ham".into(),
                    min: 0,
                    max: 1
                },
            ]
        );
        assert_eq!(creature.sounds, vec!["GROAAR"]);
        assert_eq!(creature.status, "active");
    }

    #[test]
    fn deprecated_titles_get_deprecated_status() {
        let mut context = ParserContext::new();
        context.deprecated.insert("Dragon".to_string());
        let creature = parse(&article("{{Infobox Creature|name=Dragon}}"), &context)
            .unwrap()
            .unwrap();
        assert_eq!(creature.status, "deprecated");
    }

    #[test]
    fn max_damage_total_excludes_summons_and_manadrain() {
        let damage = parse_max_damage(
            "{{Max Damage|physical=500|fire=250|lifedrain=480|energy=300|manadrain=120|summons=250}}",
        )
        .unwrap();
        assert_eq!(damage.physical, Some(500));
        assert_eq!(damage.fire, Some(250));
        assert_eq!(damage.lifedrain, Some(480));
        assert_eq!(damage.energy, Some(300));
        assert_eq!(damage.manadrain, Some(120));
        assert_eq!(damage.summons, Some(250));
        assert_eq!(damage.total, 1530);
    }

    #[test]
    fn max_damage_falls_back_to_largest_integer() {
        let damage = parse_max_damage("1500 (2000 with UE)").unwrap();
        assert_eq!(damage.total, 2000);
        assert_eq!(damage.physical, None);

        assert!(parse_max_damage("Unknown.").is_none());
        assert!(parse_max_damage("").is_none());
    }

    #[test]
    fn ability_list_with_nine_entries() {
        let field = "{{Ability List\
            |{{Melee|0-500}}\
            |{{Ability|Fire Wave|100-250|fire|scene={{Scene|spell=5sqmwave}}}}\
            |{{Ability|Great Fireball|60-140|fire|scene={{Scene|spell=gfb}}}}\
            |{{Ability|Terra Strike|90-180|earth}}\
            |{{Ability|Energy Beam|50-300|energy}}\
            |{{Ability|Curse|0-240|death}}\
            |{{Healing|250-450}}\
            |{{Ability|Haste|0|speed}}\
            |{{Summon|Demon Skeleton|2}}}}";
        let abilities = parse_abilities(field);
        assert_eq!(abilities.len(), 9);
        assert_eq!(abilities[0].element, "physical");
        assert_eq!(abilities[6].element, "healing");
        assert_eq!(abilities[8].element, "summon");
    }

    #[test]
    fn plain_paragraph_becomes_single_no_template_record() {
        let abilities = parse_abilities("Bites for up to 100 hitpoints.");
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].element, "no_template");
    }

    #[test]
    fn plain_text_entry_inside_ability_list() {
        let abilities = parse_abilities("{{Ability List|{{Melee|0-500}}|Plain text}}");
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].name, "Melee");
        assert_eq!(abilities[1].name, "Plain text");
        assert_eq!(abilities[1].element, "plain_text");
    }
}
