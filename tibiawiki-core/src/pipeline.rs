//! The staged generation pipeline: schema creation, category listings,
//! article parsing and insertion, fixed-data seeding, post-processing
//! tasks and database metadata.
//!
//! Categories declare their dependencies; a skipped category transitively
//! disables its dependents and any post-task that needs it. Every stage is
//! timed and reports success/failure counts instead of aborting the run.

use crate::api::{Article, WikiClient};
use crate::error::{Result, TibiaWikiError};
use crate::images::ImageCache;
use crate::models::RASHID_POSITIONS;
use crate::parsers::{self, ParserContext};
use crate::schema;
use crate::wikitext::{self, parse_integer, parse_links, parse_loot_statistics, parse_min_max};
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::{Connection, params};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

/// Wiki page titles starting with these prefixes never hold entity
/// articles and are dropped from category listings.
const RESERVED_NAMESPACES: [&str; 8] = [
    "User:",
    "File:",
    "Template:",
    "Category:",
    "TibiaWiki:",
    "Help:",
    "Talk:",
    "Module:",
];

const DEPRECATED_CATEGORY: &str = "Deprecated";
const NPC_OFFERS_MODULE: &str = "Module:NPCOffers/data";
const PROFICIENCY_NAMES_PAGE: &str = "Template:Weapon Proficiency Name";
const PROFICIENCY_TABLES_PAGE: &str = "Template:Weapon Proficiency Levels";
const MAP_FLOOR_COUNT: i64 = 16;

/// One ingestable entity category.
#[derive(Debug)]
pub struct Category {
    pub key: &'static str,
    pub wiki_name: &'static str,
    pub table: &'static str,
    pub depends_on: &'static [&'static str],
    /// Deprecated articles stay in the listing and carry `status =
    /// 'deprecated'` instead of being dropped.
    pub include_deprecated: bool,
    /// Keep the `title -> article_id` pairs for cross-reference
    /// post-tasks.
    pub generate_map: bool,
    pub image_folder: Option<&'static str>,
    pub image_extension: &'static str,
}

impl Category {
    /// Post-tasks need the ingested `(title, article_id)` pairs of
    /// map-generating categories and of every category whose images are
    /// fetched; for the rest the rows are dropped after the stage.
    fn records_rows(&self) -> bool {
        self.generate_map || self.image_folder.is_some()
    }
}

/// Ordered so that every title-referenced parent precedes its referrers:
/// drop and offer subselects only resolve when the parent row exists.
pub static CATEGORIES: [Category; 15] = [
    Category {
        key: "items",
        wiki_name: "Items",
        table: "item",
        depends_on: &[],
        include_deprecated: false,
        generate_map: true,
        image_folder: Some("item"),
        image_extension: "gif",
    },
    Category {
        key: "spells",
        wiki_name: "Spells",
        table: "spell",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "gif",
    },
    Category {
        key: "creatures",
        wiki_name: "Creatures",
        table: "creature",
        depends_on: &[],
        include_deprecated: false,
        generate_map: true,
        image_folder: Some("creature"),
        image_extension: "gif",
    },
    Category {
        key: "npcs",
        wiki_name: "NPCs",
        table: "npc",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: Some("npc"),
        image_extension: "gif",
    },
    Category {
        key: "quests",
        wiki_name: "Quest Overview Pages",
        table: "quest",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "houses",
        wiki_name: "Player-Ownable Buildings",
        table: "house",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "achievements",
        wiki_name: "Achievements",
        table: "achievement",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "imbuements",
        wiki_name: "Imbuements",
        table: "imbuement",
        depends_on: &["items"],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "outfits",
        wiki_name: "Outfits",
        table: "outfit",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: Some("outfit"),
        image_extension: "gif",
    },
    Category {
        key: "mounts",
        wiki_name: "Mounts",
        table: "mount",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: Some("mount"),
        image_extension: "gif",
    },
    Category {
        key: "charms",
        wiki_name: "Charms",
        table: "charm",
        depends_on: &[],
        include_deprecated: false,
        generate_map: false,
        image_folder: Some("charm"),
        image_extension: "png",
    },
    Category {
        key: "worlds",
        wiki_name: "Game Worlds",
        table: "world",
        depends_on: &[],
        include_deprecated: true,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "books",
        wiki_name: "Book Texts",
        table: "book",
        depends_on: &["items"],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "keys",
        wiki_name: "Keys",
        table: "item_key",
        depends_on: &["items"],
        include_deprecated: false,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
    Category {
        key: "updates",
        wiki_name: "Updates",
        table: "game_update",
        depends_on: &[],
        include_deprecated: true,
        generate_map: false,
        image_folder: None,
        image_extension: "png",
    },
];

pub struct PostTask {
    pub key: &'static str,
    pub dependencies: &'static [&'static str],
}

pub static POST_TASKS: [PostTask; 4] = [
    PostTask {
        key: "item_offers",
        dependencies: &["npcs", "items"],
    },
    PostTask {
        key: "loot_statistics",
        dependencies: &["creatures", "items"],
    },
    PostTask {
        key: "item_proficiency_perks",
        dependencies: &["items"],
    },
    PostTask {
        key: "images",
        dependencies: &[],
    },
];

/// All valid `--skip-categories` keys.
pub fn category_keys() -> Vec<&'static str> {
    CATEGORIES.iter().map(|c| c.key).collect()
}

/// Enabled categories after removing the skipped set and, by fixed point,
/// every category whose dependencies are no longer present. Unknown skip
/// keys are a hard error.
pub fn resolve_categories(skip: &[String]) -> Result<Vec<&'static Category>> {
    let skip: Vec<String> = skip.iter().map(|s| s.to_lowercase()).collect();
    for key in &skip {
        if !CATEGORIES.iter().any(|c| c.key == key) {
            return Err(TibiaWikiError::UnknownCategory(key.clone()));
        }
    }
    let mut enabled: Vec<&Category> = CATEGORIES
        .iter()
        .filter(|c| !skip.contains(&c.key.to_string()))
        .collect();
    loop {
        let present: HashSet<&str> = enabled.iter().map(|c| c.key).collect();
        let (kept, disabled): (Vec<&Category>, Vec<&Category>) = enabled
            .into_iter()
            .partition(|c| c.depends_on.iter().all(|d| present.contains(d)));
        for category in &disabled {
            tracing::warn!(
                "Disabling category '{}': missing dependency among {:?}",
                category.key,
                category.depends_on
            );
        }
        enabled = kept;
        if disabled.is_empty() {
            break;
        }
    }
    Ok(enabled)
}

/// Post-tasks whose dependencies are all enabled.
pub fn enabled_post_tasks(enabled: &HashSet<&str>) -> Vec<&'static PostTask> {
    POST_TASKS
        .iter()
        .filter(|task| {
            let runnable = task.dependencies.iter().all(|d| enabled.contains(d));
            if !runnable {
                tracing::warn!(
                    "Skipping post-task '{}': requires {:?}",
                    task.key,
                    task.dependencies
                );
            }
            runnable
        })
        .collect()
}

/// Per-stage progress reporting, implemented by the CLI.
pub trait ProgressHook {
    fn stage_started(&self, _stage: &str, _total: u64) {}
    fn advance(&self) {}
    fn stage_finished(&self, _stage: &str) {}
}

/// No-op hook for library use and tests.
pub struct NoProgress;

impl ProgressHook for NoProgress {}

#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub skip_images: bool,
    pub skip_deprecated: bool,
    pub skip_categories: Vec<String>,
    pub images_root: PathBuf,
}

impl GenerationOptions {
    pub fn new() -> Self {
        GenerationOptions {
            images_root: PathBuf::from("images"),
            ..Default::default()
        }
    }
}

pub struct Pipeline<C: WikiClient> {
    conn: Connection,
    client: C,
    options: GenerationOptions,
}

impl<C: WikiClient> Pipeline<C> {
    pub fn new(conn: Connection, client: C, options: GenerationOptions) -> Self {
        Pipeline {
            conn,
            client,
            options,
        }
    }

    /// Run the whole generation, returning the connection for inspection.
    pub fn run(mut self, progress: &dyn ProgressHook) -> Result<Connection> {
        let run_started = Instant::now();
        schema::create_tables(&self.conn)?;

        let enabled = resolve_categories(&self.options.skip_categories)?;
        let enabled_keys: HashSet<&str> = enabled.iter().map(|c| c.key).collect();

        let mut context = ParserContext::new();
        if self.options.skip_deprecated {
            let started = Instant::now();
            for entry in self.client.get_category_members(DEPRECATED_CATEGORY)? {
                context.deprecated.insert(entry.title);
            }
            tracing::info!(
                "Collected {} deprecated titles in {:.2?}",
                context.deprecated.len(),
                started.elapsed()
            );
        }

        let mut inserted: HashMap<&'static str, Vec<(String, i64)>> = HashMap::new();
        for category in &enabled {
            let started = Instant::now();
            match self.ingest_category(category, &context, progress) {
                Ok(rows) => {
                    tracing::info!(
                        "Category '{}': {} entities in {:.2?}",
                        category.key,
                        rows.len(),
                        started.elapsed()
                    );
                    if category.records_rows() {
                        inserted.insert(category.key, rows);
                    }
                }
                Err(e) => {
                    tracing::error!("Category '{}' failed and was rolled back: {e}", category.key);
                }
            }
            progress.stage_finished(category.key);
        }

        for position in RASHID_POSITIONS {
            position.insert(&self.conn)?;
        }

        let item_map = title_map(inserted.get("items"));
        for task in enabled_post_tasks(&enabled_keys) {
            if task.key == "images" && self.options.skip_images {
                tracing::info!("Skipping image fetching (--skip-images)");
                continue;
            }
            let started = Instant::now();
            let outcome = match task.key {
                "item_offers" => self.run_npc_offers(&item_map),
                "loot_statistics" => self.run_loot_statistics(inserted.get("creatures"), &item_map),
                "item_proficiency_perks" => self.run_proficiency_perks(&item_map),
                "images" => self.run_images(&enabled, &inserted, progress),
                _ => Ok(()),
            };
            match outcome {
                Ok(()) => {
                    tracing::info!("Post-task '{}' finished in {:.2?}", task.key, started.elapsed())
                }
                Err(e) => tracing::error!("Post-task '{}' failed: {e}", task.key),
            }
            progress.stage_finished(task.key);
        }

        self.write_metadata()?;
        tracing::info!("Generation finished in {:.2?}", run_started.elapsed());
        Ok(self.conn)
    }

    /// List, fetch, parse and insert one category inside one transaction.
    /// Returns the `(title, article_id)` pairs that made it into the
    /// database.
    fn ingest_category(
        &mut self,
        category: &Category,
        context: &ParserContext,
        progress: &dyn ProgressHook,
    ) -> Result<Vec<(String, i64)>> {
        let listing = self.client.get_category_members(category.wiki_name)?;
        let titles: Vec<String> = listing
            .into_iter()
            .map(|entry| entry.title)
            .filter(|title| !RESERVED_NAMESPACES.iter().any(|ns| title.starts_with(ns)))
            .filter(|title| category.include_deprecated || !context.deprecated.contains(title))
            .collect();
        progress.stage_started(category.key, titles.len() as u64);

        let articles = self.client.get_articles(&titles)?;
        let tx = self.conn.transaction()?;
        let mut rows = Vec::new();
        let mut unparsed = 0usize;
        for article in articles.into_iter().flatten() {
            match ingest_article(&tx, category.key, &article, context) {
                Ok(true) => rows.push((article.title, article.article_id)),
                Ok(false) => unparsed += 1,
                Err(e @ TibiaWikiError::Database(_)) => {
                    return Err(e.for_article(&article.title));
                }
                Err(e) => {
                    tracing::debug!("{}", e.for_article(&article.title));
                    unparsed += 1;
                }
            }
            progress.advance();
        }
        tx.commit()?;
        if unparsed > 0 {
            tracing::warn!("Category '{}': {} articles not parsed", category.key, unparsed);
        }
        Ok(rows)
    }

    /// Rebuild the shop-offer tables from the wiki's Lua data module.
    /// Clearing first makes the task safe to replay.
    fn run_npc_offers(&mut self, item_map: &HashMap<String, i64>) -> Result<()> {
        let Some(module) = self.client.get_article(NPC_OFFERS_MODULE)? else {
            tracing::warn!("NPC offers module '{NPC_OFFERS_MODULE}' not found");
            return Ok(());
        };
        let offers = parse_npc_offers_module(&module.content);
        let tx = self.conn.transaction()?;
        let stats = apply_npc_offers(&tx, &offers, item_map)?;
        tx.commit()?;
        if !stats.unknown_npcs.is_empty() {
            tracing::warn!(
                "{} NPCs in the offers module have no npc row: {:?}",
                stats.unknown_npcs.len(),
                stats.unknown_npcs
            );
        }
        if !stats.unknown_items.is_empty() {
            tracing::warn!(
                "{} offered items are unknown: {:?}",
                stats.unknown_items.len(),
                stats.unknown_items
            );
        }
        tracing::info!("Inserted {} shop offers", stats.inserted);
        Ok(())
    }

    /// Fetch `Loot Statistics:<title>` for every creature and replace the
    /// matching drop rows with observed chances.
    fn run_loot_statistics(
        &mut self,
        creatures: Option<&Vec<(String, i64)>>,
        item_map: &HashMap<String, i64>,
    ) -> Result<()> {
        let Some(creatures) = creatures else {
            return Ok(());
        };
        let titles: Vec<String> = creatures
            .iter()
            .map(|(title, _)| format!("Loot Statistics:{title}"))
            .collect();
        let pages = self.client.get_articles(&titles)?;
        let tx = self.conn.transaction()?;
        let mut unknown_items: Vec<String> = Vec::new();
        for (page, (_, creature_id)) in pages.into_iter().zip(creatures) {
            let Some(page) = page else { continue };
            let (kills, entries) = parse_loot_statistics(&page.content);
            if kills == 0 {
                continue;
            }
            for entry in entries {
                let chance = ((entry.times as f64 / kills as f64) * 100.0).min(100.0);
                let (min, max) = entry
                    .amount
                    .as_deref()
                    .map(parse_min_max)
                    .unwrap_or((0, 1));
                if !item_map.contains_key(&entry.item.to_lowercase()) {
                    unknown_items.push(entry.item.clone());
                    continue;
                }
                tx.execute(
                    "DELETE FROM creature_drop WHERE creature_id = ?1 AND item_title = ?2",
                    params![creature_id, entry.item],
                )?;
                tx.execute(
                    "INSERT INTO creature_drop (creature_id, item_id, item_title, min, max, chance)
                     VALUES (?1, (SELECT article_id FROM item WHERE title = ?2), ?2, ?3, ?4, ?5)",
                    params![creature_id, entry.item, min, max, chance],
                )?;
            }
        }
        tx.commit()?;
        if !unknown_items.is_empty() {
            unknown_items.sort();
            unknown_items.dedup();
            tracing::warn!(
                "{} loot-statistics items are unknown: {:?}",
                unknown_items.len(),
                unknown_items
            );
        }
        Ok(())
    }

    /// Weapon proficiency perks from the two wiki template pages.
    fn run_proficiency_perks(&mut self, item_map: &HashMap<String, i64>) -> Result<()> {
        let Some(names_page) = self.client.get_article(PROFICIENCY_NAMES_PAGE)? else {
            tracing::warn!("Proficiency names page '{PROFICIENCY_NAMES_PAGE}' not found");
            return Ok(());
        };
        let Some(tables_page) = self.client.get_article(PROFICIENCY_TABLES_PAGE)? else {
            tracing::warn!("Proficiency tables page '{PROFICIENCY_TABLES_PAGE}' not found");
            return Ok(());
        };
        let names = wikitext::parse_weapon_proficiency_name(&names_page.content);
        let tables = wikitext::parse_weapon_proficiency_tables(&tables_page.content);

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM item_proficiency_perk", [])?;
        let mut inserted = 0usize;
        for (item_title, class) in &names {
            let Some(item_id) = item_map.get(&item_title.to_lowercase()) else {
                tracing::debug!("Proficiency item '{item_title}' has no item row");
                continue;
            };
            let Some(perks) = tables.get(class) else {
                continue;
            };
            for perk in perks {
                tx.execute(
                    "INSERT INTO item_proficiency_perk (item_id, level, skill_image, icon, effect)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![item_id, perk.level, perk.skill_image, perk.icon, perk.effect],
                )?;
                inserted += 1;
            }
        }
        tx.commit()?;
        tracing::info!("Inserted {inserted} proficiency perks");
        Ok(())
    }

    /// Fetch entity sprites, the map floor renders and the outfit variant
    /// grid, going through the on-disk cache.
    fn run_images(
        &mut self,
        enabled: &[&'static Category],
        inserted: &HashMap<&'static str, Vec<(String, i64)>>,
        progress: &dyn ProgressHook,
    ) -> Result<()> {
        for category in enabled {
            let Some(folder) = category.image_folder else {
                continue;
            };
            let Some(rows) = inserted.get(category.key) else {
                continue;
            };
            if category.key == "outfits" {
                self.fetch_outfit_images(rows, progress)?;
                continue;
            }
            let files: Vec<String> = rows
                .iter()
                .map(|(title, _)| format!("{title}.{}", category.image_extension))
                .collect();
            progress.stage_started(&format!("{} images", category.key), files.len() as u64);
            let mut cache = ImageCache::open(&self.options.images_root, folder)?;
            let infos = self.client.get_images_info(&files)?;
            let mut failures: Vec<String> = Vec::new();
            for (info, (_, article_id)) in infos.into_iter().zip(rows) {
                progress.advance();
                let Some(info) = info else { continue };
                let Some(bytes) =
                    fetch_cached(&self.client, &mut cache, &info, &mut failures)?
                else {
                    continue;
                };
                self.conn.execute(
                    &format!(
                        "UPDATE {} SET image = ?1 WHERE article_id = ?2",
                        category.table
                    ),
                    params![bytes, article_id],
                )?;
            }
            cache.save()?;
            if !failures.is_empty() {
                tracing::warn!(
                    "{} images failed for '{}': {:?}",
                    failures.len(),
                    category.key,
                    failures
                );
            }
        }
        self.fetch_map_floors()?;
        Ok(())
    }

    /// Eight sprite variants per outfit: sex times addon level.
    fn fetch_outfit_images(
        &mut self,
        rows: &[(String, i64)],
        progress: &dyn ProgressHook,
    ) -> Result<()> {
        let mut requests: Vec<(String, i64, &'static str, i64)> = Vec::new();
        for (title, outfit_id) in rows {
            let name = title.trim_end_matches(" Outfits");
            for sex in ["Male", "Female"] {
                for addon in 0..=3i64 {
                    requests.push((
                        format!("Outfit {name} {sex} Addon {addon}.gif"),
                        *outfit_id,
                        sex,
                        addon,
                    ));
                }
            }
        }
        progress.stage_started("outfit images", requests.len() as u64);
        let files: Vec<String> = requests.iter().map(|(file, ..)| file.clone()).collect();
        let infos = self.client.get_images_info(&files)?;
        let mut cache = ImageCache::open(&self.options.images_root, "outfit")?;
        let mut failures: Vec<String> = Vec::new();
        for (info, (_, outfit_id, sex, addon)) in infos.into_iter().zip(&requests) {
            progress.advance();
            let Some(info) = info else { continue };
            let Some(bytes) = fetch_cached(&self.client, &mut cache, &info, &mut failures)?
            else {
                continue;
            };
            self.conn.execute(
                "INSERT INTO outfit_image (outfit_id, sex, addon, image) VALUES (?1, ?2, ?3, ?4)",
                params![outfit_id, sex, addon, bytes],
            )?;
        }
        cache.save()?;
        if !failures.is_empty() {
            tracing::warn!("{} outfit images failed: {:?}", failures.len(), failures);
        }
        Ok(())
    }

    /// The fixed set of world map renders, one per z level.
    fn fetch_map_floors(&mut self) -> Result<()> {
        let files: Vec<String> = (0..MAP_FLOOR_COUNT)
            .map(|z| format!("Map floor {z}.png"))
            .collect();
        let infos = self.client.get_images_info(&files)?;
        let mut cache = ImageCache::open(&self.options.images_root, "map")?;
        let mut failures: Vec<String> = Vec::new();
        for (info, z) in infos.into_iter().zip(0..MAP_FLOOR_COUNT) {
            let Some(info) = info else { continue };
            let Some(bytes) = fetch_cached(&self.client, &mut cache, &info, &mut failures)?
            else {
                continue;
            };
            self.conn.execute(
                "INSERT OR REPLACE INTO map (z, image) VALUES (?1, ?2)",
                params![z, bytes],
            )?;
        }
        cache.save()?;
        if !failures.is_empty() {
            tracing::warn!("{} map floors failed: {:?}", failures.len(), failures);
        }
        Ok(())
    }

    fn write_metadata(&self) -> Result<()> {
        let entries = [
            ("version", env!("CARGO_PKG_VERSION").to_string()),
            ("generated_at", Utc::now().to_rfc3339()),
            (
                "platform",
                format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            ),
            ("sqlite_version", rusqlite::version().to_string()),
        ];
        for (key, value) in entries {
            self.conn.execute(
                "INSERT OR REPLACE INTO database_info (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        Ok(())
    }
}

/// Download an image unless the cache already holds the current upload.
/// A failed download lands in `failures` and yields `None`.
fn fetch_cached<C: WikiClient>(
    client: &C,
    cache: &mut ImageCache,
    info: &crate::api::ImageInfo,
    failures: &mut Vec<String>,
) -> Result<Option<Vec<u8>>> {
    if !cache.needs_fetch(&info.file_name, &info.timestamp) {
        if let Some(bytes) = cache.load(&info.file_name)? {
            return Ok(Some(bytes));
        }
    }
    match client.download_image(&info.url) {
        Ok(bytes) => {
            cache.store(&info.file_name, &info.timestamp, &bytes)?;
            Ok(Some(bytes))
        }
        Err(e) => {
            tracing::debug!("Download of '{}' failed: {e}", info.file_name);
            failures.push(info.file_name.clone());
            Ok(None)
        }
    }
}

/// Dispatch one article to its category's parser and model insert. `true`
/// means a row was written; `false` means the infobox was absent.
fn ingest_article(
    conn: &Connection,
    key: &str,
    article: &Article,
    context: &ParserContext,
) -> Result<bool> {
    fn stored<M>(parsed: Option<M>, insert: impl FnOnce(&M) -> Result<()>) -> Result<bool> {
        match parsed {
            Some(model) => {
                insert(&model)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
    match key {
        "creatures" => stored(parsers::creature::parse(article, context)?, |m| m.insert(conn)),
        "items" => stored(parsers::item::parse(article, context)?, |m| m.insert(conn)),
        "keys" => stored(parsers::item::parse_key(article, context)?, |m| m.insert(conn)),
        "books" => stored(parsers::item::parse_book(article, context)?, |m| m.insert(conn)),
        "npcs" => stored(parsers::npc::parse(article, context)?, |m| m.insert(conn)),
        "spells" => stored(parsers::spell::parse(article, context)?, |m| m.insert(conn)),
        "quests" => stored(parsers::quest::parse(article, context)?, |m| m.insert(conn)),
        "houses" => stored(parsers::house::parse(article, context)?, |m| m.insert(conn)),
        "achievements" => {
            stored(parsers::achievement::parse(article, context)?, |m| m.insert(conn))
        }
        "imbuements" => stored(parsers::imbuement::parse(article, context)?, |m| m.insert(conn)),
        "outfits" => stored(parsers::outfit::parse(article, context)?, |m| m.insert(conn)),
        "mounts" => stored(parsers::misc::parse_mount(article, context)?, |m| m.insert(conn)),
        "charms" => stored(parsers::misc::parse_charm(article, context)?, |m| m.insert(conn)),
        "worlds" => stored(parsers::misc::parse_world(article, context)?, |m| m.insert(conn)),
        "updates" => stored(parsers::misc::parse_update(article, context)?, |m| m.insert(conn)),
        other => Err(TibiaWikiError::UnknownCategory(other.to_string())),
    }
}

fn title_map(rows: Option<&Vec<(String, i64)>>) -> HashMap<String, i64> {
    rows.map(|rows| {
        rows.iter()
            .map(|(title, id)| (title.to_lowercase(), *id))
            .collect()
    })
    .unwrap_or_default()
}

/// One offer read from the Lua data module. The price cell is either a
/// bare number (gold) or a quoted string that may carry a wikilinked
/// currency item.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOffer {
    pub item: String,
    pub value: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleNpcOffers {
    pub npc: String,
    pub buys: Vec<ModuleOffer>,
    pub sells: Vec<ModuleOffer>,
}

#[derive(Debug, Default)]
pub struct OfferStats {
    pub inserted: usize,
    pub unknown_npcs: Vec<String>,
    pub unknown_items: Vec<String>,
}

lazy_static! {
    static ref LUA_NPC: Regex = Regex::new(r#"\[\s*"([^"]+)"\s*\]\s*=\s*\{"#).unwrap();
    static ref LUA_LIST: Regex = Regex::new(r"(buys|sells)\s*=\s*\{").unwrap();
    static ref LUA_ENTRY: Regex =
        Regex::new(r#"\{\s*"([^"]+)"\s*,\s*(?:"([^"]*)"|(-?\d+))\s*\}"#).unwrap();
}

/// Parse the pure-data Lua table keyed by NPC name.
pub fn parse_npc_offers_module(content: &str) -> Vec<ModuleNpcOffers> {
    let bytes = content.as_bytes();
    let mut all = Vec::new();
    for caps in LUA_NPC.captures_iter(content) {
        let whole = caps.get(0).unwrap();
        let open = whole.end() - 1;
        let Some(end) = wikitext::find_balanced(bytes, open) else {
            continue;
        };
        let block = &content[open..end];
        let mut offers = ModuleNpcOffers {
            npc: caps[1].to_string(),
            ..Default::default()
        };
        for list_caps in LUA_LIST.captures_iter(block) {
            let list_open = list_caps.get(0).unwrap().end() - 1;
            let Some(list_end) = wikitext::find_balanced(block.as_bytes(), list_open) else {
                continue;
            };
            let entries = parse_module_entries(&block[list_open..list_end]);
            match &list_caps[1] {
                "buys" => offers.buys.extend(entries),
                _ => offers.sells.extend(entries),
            }
        }
        all.push(offers);
    }
    all
}

fn parse_module_entries(list: &str) -> Vec<ModuleOffer> {
    LUA_ENTRY
        .captures_iter(list)
        .map(|caps| {
            let item = caps[1].to_string();
            match (caps.get(2), caps.get(3)) {
                (Some(price), _) => {
                    let currency = parse_links(price.as_str())
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| "Gold Coin".to_string());
                    ModuleOffer {
                        item,
                        value: parse_integer(price.as_str(), 0).abs(),
                        currency,
                    }
                }
                (None, Some(number)) => ModuleOffer {
                    item,
                    value: parse_integer(number.as_str(), 0).abs(),
                    currency: "Gold Coin".to_string(),
                },
                (None, None) => ModuleOffer {
                    item,
                    value: 0,
                    currency: "Gold Coin".to_string(),
                },
            }
        })
        .collect()
}

/// Clear and rebuild `npc_offer_buy`/`npc_offer_sell` from the module
/// data. Rerunning with the same input always yields the same rows.
pub fn apply_npc_offers(
    conn: &Connection,
    offers: &[ModuleNpcOffers],
    item_map: &HashMap<String, i64>,
) -> Result<OfferStats> {
    conn.execute("DELETE FROM npc_offer_buy", [])?;
    conn.execute("DELETE FROM npc_offer_sell", [])?;
    let mut stats = OfferStats::default();
    for npc_offers in offers {
        let npc_id: Option<i64> = conn
            .query_row(
                "SELECT article_id FROM npc WHERE title = ?1",
                params![npc_offers.npc],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        let Some(npc_id) = npc_id else {
            stats.unknown_npcs.push(npc_offers.npc.clone());
            continue;
        };
        for (table, entries) in [
            ("npc_offer_buy", &npc_offers.buys),
            ("npc_offer_sell", &npc_offers.sells),
        ] {
            let sql = format!(
                "INSERT INTO {table} (npc_id, item_id, item_title, currency_id, currency_title, value)
                 VALUES (?1, ?2, ?3, (SELECT article_id FROM item WHERE title = ?4), ?4, ?5)"
            );
            for offer in entries.iter() {
                let item_id = item_map.get(&offer.item.to_lowercase());
                if item_id.is_none() {
                    stats.unknown_items.push(offer.item.clone());
                }
                conn.execute(
                    &sql,
                    params![npc_id, item_id, offer.item, offer.currency, offer.value],
                )?;
                stats.inserted += 1;
            }
        }
    }
    stats.unknown_items.sort();
    stats.unknown_items.dedup();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CategoryEntry, ImageInfo};
    use chrono::{TimeZone, Utc};

    #[test]
    fn skipping_items_disables_dependents_and_post_tasks() {
        let enabled = resolve_categories(&["items".to_string()]).unwrap();
        let keys: HashSet<&str> = enabled.iter().map(|c| c.key).collect();
        assert!(!keys.contains("items"));
        assert!(!keys.contains("keys"));
        assert!(!keys.contains("books"));
        assert!(!keys.contains("imbuements"));
        assert!(keys.contains("creatures"));

        let tasks: Vec<&str> = enabled_post_tasks(&keys).iter().map(|t| t.key).collect();
        assert_eq!(tasks, vec!["images"]);
    }

    #[test]
    fn resolved_set_is_a_fixed_point() {
        let enabled = resolve_categories(&["items".to_string()]).unwrap();
        let keys: HashSet<&str> = enabled.iter().map(|c| c.key).collect();
        for category in &enabled {
            for dep in category.depends_on {
                assert!(keys.contains(dep), "{} kept without {}", category.key, dep);
            }
        }
    }

    #[test]
    fn rows_are_kept_only_where_later_stages_need_them() {
        let by_key = |key: &str| CATEGORIES.iter().find(|c| c.key == key).unwrap();
        // Cross-reference lookups.
        assert!(by_key("items").records_rows());
        assert!(by_key("creatures").records_rows());
        // Image fetching.
        assert!(by_key("npcs").records_rows());
        assert!(by_key("outfits").records_rows());
        // Nothing downstream reads these.
        assert!(!by_key("quests").records_rows());
        assert!(!by_key("worlds").records_rows());
    }

    #[test]
    fn unknown_skip_key_is_a_hard_error() {
        let err = resolve_categories(&["Itemz".to_string()]).unwrap_err();
        assert!(matches!(err, TibiaWikiError::UnknownCategory(_)));
        // Case folding accepts mixed-case keys.
        assert!(resolve_categories(&["Items".to_string()]).is_ok());
    }

    #[test]
    fn lua_module_parsing_reads_both_price_shapes() {
        let module = r#"
            return {
                ["Sam"] = {
                    sells = { {"Sword", 85}, {"Good Vibes Bag", "[[Festive Token]] 5"} },
                    buys = { {"Sword", 25} },
                },
                ["Rashid"] = {
                    buys = { {"Magic Sword", 12000} },
                },
            }
        "#;
        let offers = parse_npc_offers_module(module);
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].npc, "Sam");
        assert_eq!(
            offers[0].sells,
            vec![
                ModuleOffer {
                    item: "Sword".into(),
                    value: 85,
                    currency: "Gold Coin".into()
                },
                ModuleOffer {
                    item: "Good Vibes Bag".into(),
                    value: 5,
                    currency: "Festive Token".into()
                },
            ]
        );
        assert_eq!(offers[1].buys[0].value, 12000);
    }

    #[test]
    fn npc_offers_replay_produces_identical_rows() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO npc (article_id, title, status) VALUES (1, 'Sam', 'active')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO item (article_id, title, status) VALUES (2, 'Sword', 'active')",
            [],
        )
        .unwrap();
        let offers = vec![ModuleNpcOffers {
            npc: "Sam".into(),
            sells: vec![ModuleOffer {
                item: "Sword".into(),
                value: 85,
                currency: "Gold Coin".into(),
            }],
            buys: vec![ModuleOffer {
                item: "Ghost Sword".into(),
                value: 10,
                currency: "Gold Coin".into(),
            }],
        }];
        let mut item_map = HashMap::new();
        item_map.insert("sword".to_string(), 2i64);

        let first = apply_npc_offers(&conn, &offers, &item_map).unwrap();
        let second = apply_npc_offers(&conn, &offers, &item_map).unwrap();
        assert_eq!(first.inserted, second.inserted);
        assert_eq!(second.unknown_items, vec!["Ghost Sword".to_string()]);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM npc_offer_sell", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        let unresolved: Option<i64> = conn
            .query_row("SELECT item_id FROM npc_offer_buy", [], |r| r.get(0))
            .unwrap();
        assert_eq!(unresolved, None);
    }

    /// Canned wiki for end-to-end runs without HTTP.
    struct FakeWiki {
        listings: HashMap<String, Vec<CategoryEntry>>,
        articles: HashMap<String, Article>,
    }

    impl FakeWiki {
        fn ts() -> chrono::DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        }

        fn new() -> Self {
            let mut wiki = FakeWiki {
                listings: HashMap::new(),
                articles: HashMap::new(),
            };
            wiki.add("Items", 10, "Gold Coin", "{{Infobox Object|name=Gold Coin}}");
            wiki.add(
                "Creatures",
                20,
                "Dragon",
                "{{Infobox Creature|name=Dragon|hp=1000\
                 |loot={{Loot Item|1-80|Gold Coin}}}}",
            );
            wiki.add("Creatures", 21, "User:Sandbox", "not an article");
            wiki
        }

        fn add(&mut self, category: &str, id: i64, title: &str, content: &str) {
            self.listings
                .entry(category.to_string())
                .or_default()
                .push(CategoryEntry {
                    article_id: id,
                    title: title.to_string(),
                    timestamp: Self::ts(),
                });
            self.articles.insert(
                title.to_string(),
                Article {
                    article_id: id,
                    title: title.to_string(),
                    timestamp: Self::ts(),
                    content: content.to_string(),
                },
            );
        }
    }

    impl WikiClient for FakeWiki {
        fn get_category_members(&self, name: &str) -> Result<Vec<CategoryEntry>> {
            Ok(self.listings.get(name).cloned().unwrap_or_default())
        }

        fn get_articles(&self, titles: &[String]) -> Result<Vec<Option<Article>>> {
            Ok(titles
                .iter()
                .map(|t| self.articles.get(t).cloned())
                .collect())
        }

        fn get_images_info(&self, titles: &[String]) -> Result<Vec<Option<ImageInfo>>> {
            Ok(vec![None; titles.len()])
        }

        fn download_image(&self, url: &str) -> Result<Vec<u8>> {
            Err(TibiaWikiError::Api(format!("no image backend: {url}")))
        }
    }

    #[test]
    fn end_to_end_run_links_drops_to_items() {
        let conn = Connection::open_in_memory().unwrap();
        let options = GenerationOptions {
            skip_images: true,
            ..GenerationOptions::new()
        };
        let pipeline = Pipeline::new(conn, FakeWiki::new(), options);
        let conn = pipeline.run(&NoProgress).unwrap();

        // The reserved-namespace title never reached the parser.
        let creatures: i64 = conn
            .query_row("SELECT COUNT(*) FROM creature", [], |r| r.get(0))
            .unwrap();
        assert_eq!(creatures, 1);
        // Items were ingested before creatures, so the drop resolved.
        let item_id: Option<i64> = conn
            .query_row(
                "SELECT item_id FROM creature_drop WHERE creature_id = 20",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(item_id, Some(10));
        // Fixed data and metadata always land.
        let days: i64 = conn
            .query_row("SELECT COUNT(*) FROM rashid_position", [], |r| r.get(0))
            .unwrap();
        assert_eq!(days, 7);
        let version: String = conn
            .query_row(
                "SELECT value FROM database_info WHERE key = 'version'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
        let metadata: i64 = conn
            .query_row("SELECT COUNT(*) FROM database_info", [], |r| r.get(0))
            .unwrap();
        assert_eq!(metadata, 4);
        let sqlite: String = conn
            .query_row(
                "SELECT value FROM database_info WHERE key = 'sqlite_version'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(!sqlite.is_empty());
    }
}
