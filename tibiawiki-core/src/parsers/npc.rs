//! NPC articles: shop offers, taught spells with vocation inference, and
//! travel destinations.

use crate::api::Article;
use crate::error::Result;
use crate::models::{Npc, NpcDestination, NpcOffer, NpcSpell};
use crate::parsers::{ParserContext, cleaned, integer, required_display_name, version};
use crate::wikitext::{clean_links, convert_tibiawiki_position, find_template, find_templates,
    parse_integer};

const TEMPLATE: &str = "Infobox NPC";
const DEFAULT_CURRENCY: &str = "Gold Coin";

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<Npc>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let jobs = collect_numbered(&infobox, "job");
    let buys = infobox.get("buys").unwrap_or("");
    let sells = infobox.get("sells").unwrap_or("");
    let notes = infobox.get("notes").unwrap_or("");

    let mut buy_offers = parse_offers(buys, "Price to Buy");
    buy_offers.extend(parse_offers(buys, "NPC List"));
    let mut sell_offers = parse_offers(sells, "Price to Sell");
    // Trades carry signed prices; a negative figure still means "sells at".
    for offer in find_templates(sells, "Trades/Sells", false)
        .into_iter()
        .flat_map(|t| offers_from_entries(t.positional()))
    {
        sell_offers.push(NpcOffer {
            value: offer.value.abs(),
            ..offer
        });
    }

    let mut destinations = parse_destinations(notes);
    destinations.extend(parse_destinations(sells));

    let npc = Npc {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        gender: cleaned(&infobox, "gender"),
        races: collect_numbered(&infobox, "race"),
        jobs: jobs.clone(),
        city: cleaned(&infobox, "city"),
        subarea: cleaned(&infobox, "subarea"),
        location: cleaned(&infobox, "location"),
        x: infobox.get("posx").map(convert_tibiawiki_position),
        y: infobox.get("posy").map(convert_tibiawiki_position),
        z: integer(&infobox, "posz"),
        version: version(&infobox),
        status: context.status(&article.title),
        buy_offers,
        sell_offers,
        teaches: parse_teaches(&article.content, &article.title, jobs.as_deref().unwrap_or("")),
        destinations,
    };
    Ok(Some(npc))
}

/// Join `key`, `key2`, `key3`, ... fields into one comma-separated list.
fn collect_numbered(infobox: &crate::wikitext::Template, key: &str) -> Option<String> {
    let mut values = Vec::new();
    if let Some(first) = infobox.get(key) {
        values.push(clean_links(first, false));
    }
    for i in 2..=6 {
        if let Some(value) = infobox.get(&format!("{key}{i}")) {
            values.push(clean_links(value, false));
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Offer templates hold positional entries of the form `Item`,
/// `Item,price` or `Item,price,Currency`; the item may carry a trailing
/// `;constraint` that is dropped.
fn parse_offers(field: &str, template_name: &str) -> Vec<NpcOffer> {
    find_templates(field, template_name, false)
        .into_iter()
        .flat_map(|t| offers_from_entries(t.positional()))
        .collect()
}

fn offers_from_entries(entries: Vec<&str>) -> Vec<NpcOffer> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let mut parts = entry.splitn(3, ',');
            let item = clean_links(parts.next()?, false);
            let item = item.split(';').next().unwrap_or("").trim().to_string();
            if item.is_empty() {
                return None;
            }
            let value = parts.next().map(|p| parse_integer(p, 0)).unwrap_or(0);
            let currency = parts
                .next()
                .map(|p| clean_links(p, false))
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
            Some(NpcOffer {
                item_title: item,
                currency_title: currency,
                value,
            })
        })
        .collect()
}

/// `Teaches` blocks. Vocations come from the group label when it names
/// any, otherwise from the NPC's job list. Duplicate spells are folded
/// into one entry with the union of the flags.
fn parse_teaches(content: &str, npc_title: &str, jobs: &str) -> Vec<NpcSpell> {
    let mut spells: Vec<NpcSpell> = Vec::new();
    for block in find_templates(content, "Teaches", false) {
        let label = block.get("name").unwrap_or("");
        let mut flags = vocation_flags(label);
        if flags == (false, false, false, false, false) {
            flags = vocation_flags(jobs);
        }
        if let Some(overridden) = vocation_overrides(npc_title) {
            flags = overridden;
        }
        let (knight, sorcerer, druid, paladin, monk) = flags;
        for entry in block.positional() {
            let title = clean_links(entry, false);
            if title.is_empty() {
                continue;
            }
            match spells.iter_mut().find(|s| s.spell_title == title) {
                Some(existing) => {
                    existing.knight |= knight;
                    existing.sorcerer |= sorcerer;
                    existing.druid |= druid;
                    existing.paladin |= paladin;
                    existing.monk |= monk;
                }
                None => spells.push(NpcSpell {
                    spell_title: title,
                    knight,
                    sorcerer,
                    druid,
                    paladin,
                    monk,
                }),
            }
        }
    }
    spells
}

fn vocation_flags(label: &str) -> (bool, bool, bool, bool, bool) {
    let label = label.to_lowercase();
    (
        label.contains("knight"),
        label.contains("sorcerer"),
        label.contains("druid"),
        label.contains("paladin"),
        label.contains("monk"),
    )
}

/// A few guild teachers never state their vocation in the article text.
fn vocation_overrides(npc_title: &str) -> Option<(bool, bool, bool, bool, bool)> {
    match npc_title {
        "Eliza" => Some((true, true, true, true, false)),
        "Ursula" => Some((false, false, false, true, false)),
        "Elathriel" => Some((false, false, true, false, false)),
        _ => None,
    }
}

/// `Transport` blocks: positional entries `Destination, price` with an
/// optional `;note` suffix.
fn parse_destinations(field: &str) -> Vec<NpcDestination> {
    find_templates(field, "Transport", false)
        .into_iter()
        .flat_map(|t| {
            t.positional()
                .into_iter()
                .filter_map(|entry| {
                    let (entry, note) = match entry.split_once(';') {
                        Some((head, tail)) => (head, Some(clean_links(tail, false))),
                        None => (entry, None),
                    };
                    let (name, price) = match entry.split_once(',') {
                        Some((name, price)) => (name, parse_integer(price, 0)),
                        None => (entry, 0),
                    };
                    let name = clean_links(name, false);
                    if name.is_empty() {
                        return None;
                    }
                    Some(NpcDestination {
                        name,
                        price,
                        notes: note.filter(|n| !n.is_empty()),
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
