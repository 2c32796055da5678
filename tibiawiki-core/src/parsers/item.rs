//! Item, key and book articles. The item parser carries the closed
//! attribute vocabulary and the compound `attrib`/`resist` splitters.

use crate::api::Article;
use crate::error::Result;
use crate::models::{Book, Item, ItemAttribute, ItemStoreOffer, Key};
use crate::parsers::{
    ParserContext, boolean, cleaned, display_name, integer, required_display_name, text, version,
};
use crate::wikitext::{
    clean_links, client_color_to_rgb, find_template, find_templates, parse_integer, parse_sounds,
};
use lazy_static::lazy_static;
use regex::Regex;

const TEMPLATE: &str = "Infobox Object";

/// Infobox field to attribute name. Fields not listed here are discarded.
const ATTRIBUTE_FIELDS: [(&str, &str); 24] = [
    ("levelrequired", "level"),
    ("vocrequired", "vocation"),
    ("attack", "attack"),
    ("fire_attack", "fire_attack"),
    ("earth_attack", "earth_attack"),
    ("ice_attack", "ice_attack"),
    ("energy_attack", "energy_attack"),
    ("defense", "defense"),
    ("defensemod", "defense_modifier"),
    ("armor", "armor"),
    ("hands", "hands"),
    ("weapontype", "weapon_type"),
    ("damagetype", "damage_type"),
    ("damagerange", "damage_range"),
    ("magiclevel", "magic_level"),
    ("mana", "mana_cost"),
    ("words", "words"),
    ("charges", "charges"),
    ("duration", "duration"),
    ("imbueslots", "imbue_slots"),
    ("imbuements", "imbuements"),
    ("volume", "volume"),
    ("range", "range"),
    ("upgradeclass", "upgrade_class"),
];

lazy_static! {
    static ref PERFECT_SHOT: Regex =
        Regex::new(r"(?i)perfect shot \+?(\d+)% at range (\d+)").unwrap();
    static ref DAMAGE_REFLECTION: Regex = Regex::new(r"(?i)damage reflection \+?(\d+)").unwrap();
    static ref MAGIC_SHIELD_CAPACITY: Regex =
        Regex::new(r"(?i)magic shield capacity \+?(\d+)(?:\s*(?:and|/)\s*(\d+)%)?").unwrap();
    static ref REGENERATION: Regex = Regex::new(r"(?i)(faster regeneration)").unwrap();
    static ref NAME_BONUS: Regex =
        Regex::new(r"([a-z][a-z ]+[a-z])\s*([+-]\d+)").unwrap();
    static ref RESIST_ENTRY: Regex = Regex::new(r"([a-z]+)\s*([+-]?\d+)%").unwrap();
}

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Item>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let mut attributes = Vec::new();
    for (field, name) in ATTRIBUTE_FIELDS {
        if let Some(value) = cleaned(&infobox, field) {
            attributes.push(ItemAttribute {
                name: name.to_string(),
                value,
            });
        }
    }
    if let Some(attrib) = infobox.get("attrib") {
        attributes.extend(parse_compound_attributes(attrib));
    }
    if let Some(resist) = infobox.get("resist") {
        attributes.extend(parse_resistances(resist));
    }

    let item = Item {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        actual_name: cleaned(&infobox, "actualname"),
        plural: cleaned(&infobox, "plural"),
        article: text(&infobox, "article"),
        marketable: boolean(&infobox, "marketable"),
        stackable: boolean(&infobox, "stackable"),
        pickupable: boolean(&infobox, "pickupable"),
        immobile: boolean(&infobox, "immobile"),
        value_sell: integer(&infobox, "npcvalue"),
        value_buy: integer(&infobox, "npcprice"),
        weight: infobox
            .get("weight")
            .map(|v| crate::wikitext::parse_float(v, 0.0)),
        flavor_text: cleaned(&infobox, "flavortext"),
        item_class: cleaned(&infobox, "objectclass"),
        type_primary: cleaned(&infobox, "primarytype"),
        type_secondary: cleaned(&infobox, "secondarytype"),
        light_color: integer(&infobox, "lightcolor").map(client_color_to_rgb),
        light_radius: integer(&infobox, "lightradius"),
        client_id: integer(&infobox, "itemid"),
        version: version(&infobox),
        status: context.status(&article.title),
        attributes,
        sounds: infobox
            .get("sounds")
            .map(parse_sounds)
            .unwrap_or_default(),
        store_offers: infobox
            .get("storevalue")
            .map(parse_store_offers)
            .unwrap_or_default(),
    };
    Ok(Some(item))
}

/// Split the free-text `attrib` field into the attributes it encodes. The
/// compound phrases are matched first and blanked out so the generic
/// `name +N` sweep cannot double-count their numbers.
fn parse_compound_attributes(attrib: &str) -> Vec<ItemAttribute> {
    let mut attributes = Vec::new();
    let mut remainder = clean_links(attrib, false).to_lowercase();

    if let Some(caps) = PERFECT_SHOT.captures(&remainder) {
        attributes.push(ItemAttribute {
            name: "perfect_shot".to_string(),
            value: caps[1].to_string(),
        });
        attributes.push(ItemAttribute {
            name: "perfect_shot_range".to_string(),
            value: caps[2].to_string(),
        });
        let range = caps.get(0).unwrap().range();
        remainder.replace_range(range, "");
    }
    if let Some(caps) = DAMAGE_REFLECTION.captures(&remainder) {
        attributes.push(ItemAttribute {
            name: "damage_reflection".to_string(),
            value: caps[1].to_string(),
        });
        let range = caps.get(0).unwrap().range();
        remainder.replace_range(range, "");
    }
    if let Some(caps) = MAGIC_SHIELD_CAPACITY.captures(&remainder) {
        attributes.push(ItemAttribute {
            name: "magic_shield_capacity".to_string(),
            value: caps[1].to_string(),
        });
        if let Some(percent) = caps.get(2) {
            attributes.push(ItemAttribute {
                name: "magic_shield_capacity_percent".to_string(),
                value: percent.as_str().to_string(),
            });
        }
        let range = caps.get(0).unwrap().range();
        remainder.replace_range(range, "");
    }
    if REGENERATION.is_match(&remainder) {
        attributes.push(ItemAttribute {
            name: "regeneration".to_string(),
            value: "faster regeneration".to_string(),
        });
    }
    for caps in NAME_BONUS.captures_iter(&remainder) {
        attributes.push(ItemAttribute {
            name: caps[1].trim().replace(' ', "_"),
            value: caps[2].to_string(),
        });
    }
    attributes
}

/// `"physical +5%, fire -3%"` becomes `physical% = +5`, `fire% = -3`.
fn parse_resistances(resist: &str) -> Vec<ItemAttribute> {
    RESIST_ENTRY
        .captures_iter(&clean_links(resist, false).to_lowercase())
        .map(|caps| ItemAttribute {
            name: format!("{}%", &caps[1]),
            value: caps[2].to_string(),
        })
        .collect()
}

/// Zero or more `Store Product` templates in the `storevalue` field.
fn parse_store_offers(field: &str) -> Vec<ItemStoreOffer> {
    find_templates(field, "Store Product", false)
        .into_iter()
        .map(|t| {
            let positional = t.positional();
            ItemStoreOffer {
                price: positional
                    .first()
                    .map(|v| parse_integer(v, 0))
                    .unwrap_or(0),
                currency: positional
                    .get(1)
                    .map(|v| clean_links(v, false))
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| "Tibia Coin".to_string()),
                amount: positional
                    .get(2)
                    .map(|v| parse_integer(v, 1))
                    .unwrap_or(1),
            }
        })
        .collect()
}

pub fn parse_key(article: &Article, context: &ParserContext) -> Result<Option<Key>> {
    let Some(infobox) = find_template(&article.content, "Infobox Key", false) else {
        return Ok(None);
    };
    let key = Key {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        number: integer(&infobox, "number"),
        material: cleaned(&infobox, "material").map(capitalize),
        location: cleaned(&infobox, "location"),
        origin: cleaned(&infobox, "origin"),
        notes: infobox
            .get("shortnotes")
            .or_else(|| infobox.get("notes"))
            .map(|v| clean_links(v, true))
            .filter(|v| !v.is_empty()),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(key))
}

pub fn parse_book(article: &Article, context: &ParserContext) -> Result<Option<Book>> {
    let Some(infobox) = find_template(&article.content, "Infobox Book", false) else {
        return Ok(None);
    };
    let book = Book {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: display_name(&infobox),
        book_type: cleaned(&infobox, "booktype"),
        author: cleaned(&infobox, "author"),
        prev_book: cleaned(&infobox, "prevbook"),
        next_book: cleaned(&infobox, "nextbook"),
        location: cleaned(&infobox, "location"),
        blurb: cleaned(&infobox, "blurb"),
        text: infobox
            .get("text")
            .map(|v| clean_links(v, true))
            .filter(|v| !v.is_empty()),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(book))
}

/// Uppercase the first letter so `silver` matches the `Silver Key` item.
fn capitalize(value: String) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, content: &str) -> Article {
        Article {
            article_id: 9,
            title: title.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: content.to_string(),
        }
    }

    #[test]
    fn item_base_fields_and_dictionary_attributes() {
        let content = "{{Infobox Object|name=Magic Sword|actualname=magic sword\
            |levelrequired=80|attack=48|defense=35|weight=42.00|npcvalue=12000\
            |stackable=no|pickupable=yes|lightcolor=3|unlistedfield=junk}}";
        let context = ParserContext::new();
        let item = parse(&article("Magic Sword", content), &context)
            .unwrap()
            .unwrap();
        assert_eq!(item.name.as_deref(), Some("magic sword"));
        assert_eq!(item.value_sell, Some(12000));
        assert_eq!(item.weight, Some(42.0));
        assert_eq!(item.light_color, Some(0x99));
        assert!(item.pickupable);
        let names: Vec<&str> = item.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["level", "attack", "defense"]);
        assert!(!names.contains(&"unlistedfield"));
    }

    #[test]
    fn compound_attrib_field_is_split() {
        let attributes = parse_compound_attributes(
            "distance fighting +3, perfect shot +25% at range 5, damage reflection 8",
        );
        let find = |name: &str| {
            attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str())
        };
        assert_eq!(find("perfect_shot"), Some("25"));
        assert_eq!(find("perfect_shot_range"), Some("5"));
        assert_eq!(find("damage_reflection"), Some("8"));
        assert_eq!(find("distance_fighting"), Some("+3"));
    }

    #[test]
    fn magic_shield_capacity_both_figures() {
        let attributes =
            parse_compound_attributes("magic shield capacity +300 and 9%, faster regeneration");
        let find = |name: &str| {
            attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str())
        };
        assert_eq!(find("magic_shield_capacity"), Some("300"));
        assert_eq!(find("magic_shield_capacity_percent"), Some("9"));
        assert!(find("regeneration").is_some());
    }

    #[test]
    fn resistances_per_element() {
        let attributes = parse_resistances("[[Physical Damage|physical]] +5%, fire -3%");
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].name, "physical%");
        assert_eq!(attributes[0].value, "+5");
        assert_eq!(attributes[1].name, "fire%");
        assert_eq!(attributes[1].value, "-3");
    }

    #[test]
    fn store_offers_with_defaults() {
        let offers = parse_store_offers("{{Store Product|50}}{{Store Product|250|Gold Coin|100}}");
        assert_eq!(
            offers,
            vec![
                ItemStoreOffer {
                    price: 50,
                    currency: "Tibia Coin".into(),
                    amount: 1
                },
                ItemStoreOffer {
                    price: 250,
                    currency: "Gold Coin".into(),
                    amount: 100
                },
            ]
        );
    }

    #[test]
    fn key_material_is_capitalized() {
        let content = "{{Infobox Key|number=3700|material=silver|location=[[Thais]]}}";
        let context = ParserContext::new();
        let key = parse_key(&article("Key 3700", content), &context)
            .unwrap()
            .unwrap();
        assert_eq!(key.number, Some(3700));
        assert_eq!(key.material.as_deref(), Some("Silver"));
        assert_eq!(key.location.as_deref(), Some("Thais"));
    }
}
