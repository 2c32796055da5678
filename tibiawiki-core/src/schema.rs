//! Declarative table definitions and the typed helpers built on them.
//!
//! Every table the generator writes is declared here as a static. The
//! pipeline's first stage emits `CREATE TABLE` statements straight from
//! these declarations; [`Table::insert`], [`Table::get_by_field`] and
//! [`Table::search`] validate column names and value types against them so
//! a typo'd column is a typed error instead of a silent empty result.

use crate::error::{Result, TibiaWikiError};
use rusqlite::Connection;
use rusqlite::types::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Blob,
}

impl ColumnType {
    fn sql_name(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub nullable: bool,
    pub indexed: bool,
    pub default: Option<&'static str>,
    pub references: Option<(&'static str, &'static str)>,
}

impl Column {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Column {
            name,
            column_type,
            primary_key: false,
            auto_increment: false,
            nullable: true,
            indexed: false,
            default: None,
            references: None,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Column::new(name, ColumnType::Integer)
    }

    pub const fn real(name: &'static str) -> Self {
        Column::new(name, ColumnType::Real)
    }

    pub const fn text(name: &'static str) -> Self {
        Column::new(name, ColumnType::Text)
    }

    pub const fn blob(name: &'static str) -> Self {
        Column::new(name, ColumnType::Blob)
    }

    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// AUTOINCREMENT implies PRIMARY KEY; only valid on integer columns.
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub const fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some((table, column));
        self
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| TibiaWikiError::UnknownColumn {
            table: self.name.to_string(),
            column: name.to_string(),
        })
    }

    /// `CREATE TABLE IF NOT EXISTS` plus `CREATE INDEX` statements for the
    /// indexed columns.
    pub fn create_sql(&self) -> String {
        let mut defs = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            debug_assert!(
                !(column.primary_key && column.default.is_some()),
                "primary key and default are mutually exclusive"
            );
            debug_assert!(
                !column.auto_increment || column.column_type == ColumnType::Integer,
                "autoincrement requires an integer column"
            );
            let mut def = format!("    {} {}", column.name, column.column_type.sql_name());
            if column.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.auto_increment {
                def.push_str(" AUTOINCREMENT");
            }
            if !column.nullable && !column.primary_key {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = column.default {
                def.push_str(&format!(" DEFAULT {default}"));
            }
            if let Some((table, referenced)) = column.references {
                def.push_str(&format!(" REFERENCES {table}({referenced})"));
            }
            defs.push(def);
        }
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
            self.name,
            defs.join(",\n")
        );
        for column in self.columns.iter().filter(|c| c.indexed) {
            sql.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({});\n",
                self.name, column.name, self.name, column.name
            ));
        }
        sql
    }

    fn check_value(&self, column: &Column, value: &Value) -> Result<()> {
        let mismatch = |detail: &str| TibiaWikiError::TypeMismatch {
            table: self.name.to_string(),
            column: column.name.to_string(),
            detail: detail.to_string(),
        };
        match value {
            Value::Null => {
                if column.nullable {
                    Ok(())
                } else {
                    Err(TibiaWikiError::NullViolation {
                        table: self.name.to_string(),
                        column: column.name.to_string(),
                    })
                }
            }
            Value::Integer(_) => match column.column_type {
                ColumnType::Integer | ColumnType::Real => Ok(()),
                _ => Err(mismatch("expected integer column")),
            },
            Value::Real(_) => match column.column_type {
                ColumnType::Real => Ok(()),
                _ => Err(mismatch("expected real column")),
            },
            Value::Text(_) => match column.column_type {
                ColumnType::Text => Ok(()),
                _ => Err(mismatch("expected text column")),
            },
            Value::Blob(_) => match column.column_type {
                ColumnType::Blob => Ok(()),
                _ => Err(mismatch("expected blob column")),
            },
        }
    }

    /// Type-checked insert. Only declared columns are accepted and every
    /// value is validated against the declared column type before the
    /// statement is prepared. Returns the new rowid.
    pub fn insert(&self, conn: &Connection, values: &[(&str, Value)]) -> Result<i64> {
        let mut names = Vec::with_capacity(values.len());
        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(values.len());
        for (name, value) in values {
            let column = self.require_column(name)?;
            self.check_value(column, value)?;
            names.push(*name);
            params.push(value);
        }
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders.join(", ")
        );
        conn.execute(&sql, params.as_slice())?;
        Ok(conn.last_insert_rowid())
    }

    fn row_to_map(row: &rusqlite::Row, names: &[String]) -> rusqlite::Result<HashMap<String, Value>> {
        let mut map = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), row.get::<_, Value>(i)?);
        }
        Ok(map)
    }

    /// Fetch one row by column value. An unknown column is a typed error,
    /// never an empty result.
    pub fn get_by_field(
        &self,
        conn: &Connection,
        field: &str,
        value: &Value,
        like: bool,
    ) -> Result<Option<HashMap<String, Value>>> {
        self.require_column(field)?;
        let operator = if like { "LIKE" } else { "=" };
        let sql = format!("SELECT * FROM {} WHERE {} {} ?1", self.name, field, operator);
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_map(row, &names)?)),
            None => Ok(None),
        }
    }

    /// Fetch all rows matching a column value, optionally sorted. Both the
    /// filter and sort columns must be declared.
    pub fn search(
        &self,
        conn: &Connection,
        field: &str,
        value: &Value,
        sort_by: Option<&str>,
        ascending: bool,
    ) -> Result<Vec<HashMap<String, Value>>> {
        self.require_column(field)?;
        let mut sql = format!("SELECT * FROM {} WHERE {} = ?1", self.name, field);
        if let Some(sort) = sort_by {
            self.require_column(sort)?;
            sql.push_str(&format!(
                " ORDER BY {} {}",
                sort,
                if ascending { "ASC" } else { "DESC" }
            ));
        }
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query([value])?;
        let mut results = Vec::new();
        while let Some(row) = rows.next()? {
            results.push(Self::row_to_map(row, &names)?);
        }
        Ok(results)
    }
}

macro_rules! table {
    ($static_name:ident, $cols_name:ident, $table_name:literal, [$($col:expr),+ $(,)?]) => {
        static $cols_name: &[Column] = &[$($col),+];
        pub static $static_name: Table = Table {
            name: $table_name,
            columns: $cols_name,
        };
    };
}

table!(CREATURE, CREATURE_COLUMNS, "creature", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("article"),
    Column::text("plural"),
    Column::text("library_race"),
    Column::text("creature_class"),
    Column::text("type_primary"),
    Column::text("type_secondary"),
    Column::text("bestiary_class"),
    Column::text("bestiary_level"),
    Column::text("bestiary_occurrence"),
    Column::int("hitpoints"),
    Column::int("experience"),
    Column::int("armor"),
    Column::int("mitigation"),
    Column::int("speed"),
    Column::int("runs_at"),
    Column::int("summon_cost"),
    Column::int("convince_cost"),
    Column::int("illusionable"),
    Column::int("pushable"),
    Column::int("push_objects"),
    Column::int("sees_invisible"),
    Column::int("paralysable"),
    Column::int("boss"),
    Column::int("modifier_physical"),
    Column::int("modifier_earth"),
    Column::int("modifier_fire"),
    Column::int("modifier_ice"),
    Column::int("modifier_energy"),
    Column::int("modifier_death"),
    Column::int("modifier_holy"),
    Column::int("modifier_drown"),
    Column::int("modifier_lifedrain"),
    Column::int("modifier_healing"),
    Column::text("walks_through"),
    Column::text("walks_around"),
    Column::text("location"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
    Column::blob("image"),
]);

table!(CREATURE_DROP, CREATURE_DROP_COLUMNS, "creature_drop", [
    Column::int("creature_id")
        .not_null()
        .indexed()
        .references("creature", "article_id"),
    Column::int("item_id").indexed().references("item", "article_id"),
    Column::text("item_title").not_null(),
    Column::int("min").not_null().default_value("0"),
    Column::int("max").not_null().default_value("1"),
    Column::real("chance"),
]);

table!(CREATURE_ABILITY, CREATURE_ABILITY_COLUMNS, "creature_ability", [
    Column::int("creature_id")
        .not_null()
        .indexed()
        .references("creature", "article_id"),
    Column::text("name"),
    Column::text("effect"),
    Column::text("element"),
]);

table!(CREATURE_MAX_DAMAGE, CREATURE_MAX_DAMAGE_COLUMNS, "creature_max_damage", [
    Column::int("creature_id")
        .not_null()
        .indexed()
        .references("creature", "article_id"),
    Column::int("physical"),
    Column::int("earth"),
    Column::int("fire"),
    Column::int("ice"),
    Column::int("energy"),
    Column::int("death"),
    Column::int("holy"),
    Column::int("drown"),
    Column::int("lifedrain"),
    Column::int("manadrain"),
    Column::int("summons"),
    Column::int("total"),
]);

table!(CREATURE_SOUND, CREATURE_SOUND_COLUMNS, "creature_sound", [
    Column::int("creature_id")
        .not_null()
        .indexed()
        .references("creature", "article_id"),
    Column::text("content").not_null(),
]);

table!(ITEM, ITEM_COLUMNS, "item", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("actual_name"),
    Column::text("plural"),
    Column::text("article"),
    Column::int("marketable"),
    Column::int("stackable"),
    Column::int("pickupable"),
    Column::int("immobile"),
    Column::int("value_sell"),
    Column::int("value_buy"),
    Column::real("weight"),
    Column::text("flavor_text"),
    Column::text("item_class"),
    Column::text("type_primary"),
    Column::text("type_secondary"),
    Column::int("light_color"),
    Column::int("light_radius"),
    Column::int("client_id"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
    Column::blob("image"),
]);

table!(ITEM_ATTRIBUTE, ITEM_ATTRIBUTE_COLUMNS, "item_attribute", [
    Column::int("item_id")
        .not_null()
        .indexed()
        .references("item", "article_id"),
    Column::text("name").not_null(),
    Column::text("value").not_null(),
]);

table!(ITEM_SOUND, ITEM_SOUND_COLUMNS, "item_sound", [
    Column::int("item_id")
        .not_null()
        .indexed()
        .references("item", "article_id"),
    Column::text("content").not_null(),
]);

table!(ITEM_STORE_OFFER, ITEM_STORE_OFFER_COLUMNS, "item_store_offer", [
    Column::int("item_id")
        .not_null()
        .indexed()
        .references("item", "article_id"),
    Column::int("price").not_null(),
    Column::text("currency"),
    Column::int("amount"),
]);

table!(ITEM_KEY, ITEM_KEY_COLUMNS, "item_key", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::int("number").indexed(),
    Column::int("item_id").references("item", "article_id"),
    Column::text("material"),
    Column::text("location"),
    Column::text("origin"),
    Column::text("notes"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(BOOK, BOOK_COLUMNS, "book", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name"),
    Column::text("book_type"),
    Column::int("item_id").references("item", "article_id"),
    Column::text("author"),
    Column::text("prev_book"),
    Column::text("next_book"),
    Column::text("location"),
    Column::text("blurb"),
    Column::text("text"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(NPC, NPC_COLUMNS, "npc", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("gender"),
    Column::text("races"),
    Column::text("jobs"),
    Column::text("city"),
    Column::text("subarea"),
    Column::text("location"),
    Column::int("x"),
    Column::int("y"),
    Column::int("z"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
    Column::blob("image"),
]);

table!(NPC_OFFER_BUY, NPC_OFFER_BUY_COLUMNS, "npc_offer_buy", [
    Column::int("npc_id")
        .not_null()
        .indexed()
        .references("npc", "article_id"),
    Column::int("item_id").indexed().references("item", "article_id"),
    Column::text("item_title").not_null(),
    Column::int("currency_id").references("item", "article_id"),
    Column::text("currency_title"),
    Column::int("value").not_null(),
]);

table!(NPC_OFFER_SELL, NPC_OFFER_SELL_COLUMNS, "npc_offer_sell", [
    Column::int("npc_id")
        .not_null()
        .indexed()
        .references("npc", "article_id"),
    Column::int("item_id").indexed().references("item", "article_id"),
    Column::text("item_title").not_null(),
    Column::int("currency_id").references("item", "article_id"),
    Column::text("currency_title"),
    Column::int("value").not_null(),
]);

table!(NPC_SPELL, NPC_SPELL_COLUMNS, "npc_spell", [
    Column::int("npc_id")
        .not_null()
        .indexed()
        .references("npc", "article_id"),
    Column::int("spell_id").indexed().references("spell", "article_id"),
    Column::text("spell_title").not_null(),
    Column::int("knight").not_null().default_value("0"),
    Column::int("sorcerer").not_null().default_value("0"),
    Column::int("druid").not_null().default_value("0"),
    Column::int("paladin").not_null().default_value("0"),
    Column::int("monk").not_null().default_value("0"),
]);

table!(NPC_DESTINATION, NPC_DESTINATION_COLUMNS, "npc_destination", [
    Column::int("npc_id")
        .not_null()
        .indexed()
        .references("npc", "article_id"),
    Column::text("name").not_null(),
    Column::int("price"),
    Column::text("notes"),
]);

table!(SPELL, SPELL_COLUMNS, "spell", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("effect"),
    Column::text("words"),
    Column::text("spell_type"),
    Column::text("group_spell"),
    Column::text("group_secondary"),
    Column::text("group_rune"),
    Column::text("element"),
    Column::int("mana"),
    Column::int("soul"),
    Column::int("cooldown"),
    Column::int("cooldown2"),
    Column::int("cooldown3"),
    Column::text("cooldown_group"),
    Column::text("cooldown_group2"),
    Column::int("level"),
    Column::int("premium"),
    Column::int("promotion"),
    Column::int("wheel"),
    Column::int("passive"),
    Column::int("knight"),
    Column::int("sorcerer"),
    Column::int("druid"),
    Column::int("paladin"),
    Column::int("monk"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(QUEST, QUEST_COLUMNS, "quest", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("location"),
    Column::int("rookgaard"),
    Column::text("quest_type"),
    Column::int("quest_log"),
    Column::text("legend"),
    Column::int("level_required"),
    Column::int("level_recommended"),
    Column::text("active_time"),
    Column::text("estimated_time"),
    Column::int("premium"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(QUEST_REWARD, QUEST_REWARD_COLUMNS, "quest_reward", [
    Column::int("quest_id")
        .not_null()
        .indexed()
        .references("quest", "article_id"),
    Column::int("item_id").indexed().references("item", "article_id"),
    Column::text("item_title").not_null(),
]);

table!(QUEST_DANGER, QUEST_DANGER_COLUMNS, "quest_danger", [
    Column::int("quest_id")
        .not_null()
        .indexed()
        .references("quest", "article_id"),
    Column::int("creature_id")
        .indexed()
        .references("creature", "article_id"),
    Column::text("creature_title").not_null(),
]);

table!(HOUSE, HOUSE_COLUMNS, "house", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::int("house_id").indexed(),
    Column::text("name"),
    Column::int("guildhall"),
    Column::text("city").indexed(),
    Column::text("street"),
    Column::int("beds"),
    Column::int("rent"),
    Column::int("size"),
    Column::int("rooms"),
    Column::int("floors"),
    Column::int("x"),
    Column::int("y"),
    Column::int("z"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(ACHIEVEMENT, ACHIEVEMENT_COLUMNS, "achievement", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::int("grade"),
    Column::int("points"),
    Column::text("description"),
    Column::text("spoiler"),
    Column::int("secret"),
    Column::int("premium"),
    Column::int("achievement_id"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(IMBUEMENT, IMBUEMENT_COLUMNS, "imbuement", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("tier"),
    Column::text("imbuement_type"),
    Column::text("category"),
    Column::text("effect"),
    Column::text("slots"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(IMBUEMENT_MATERIAL, IMBUEMENT_MATERIAL_COLUMNS, "imbuement_material", [
    Column::int("imbuement_id")
        .not_null()
        .indexed()
        .references("imbuement", "article_id"),
    Column::int("item_id").indexed().references("item", "article_id"),
    Column::text("item_title").not_null(),
    Column::int("amount").not_null(),
]);

table!(OUTFIT, OUTFIT_COLUMNS, "outfit", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("outfit_type"),
    Column::int("premium"),
    Column::int("tournament"),
    Column::int("bought"),
    Column::int("full_price"),
    Column::text("achievement"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(OUTFIT_IMAGE, OUTFIT_IMAGE_COLUMNS, "outfit_image", [
    Column::int("outfit_id")
        .not_null()
        .indexed()
        .references("outfit", "article_id"),
    Column::text("sex").not_null(),
    Column::int("addon").not_null(),
    Column::blob("image"),
]);

table!(OUTFIT_QUEST, OUTFIT_QUEST_COLUMNS, "outfit_quest", [
    Column::int("outfit_id")
        .not_null()
        .indexed()
        .references("outfit", "article_id"),
    Column::int("quest_id").indexed().references("quest", "article_id"),
    Column::text("quest_title").not_null(),
    Column::text("quest_type").not_null(),
]);

table!(ITEM_PROFICIENCY_PERK, ITEM_PROFICIENCY_PERK_COLUMNS, "item_proficiency_perk", [
    Column::int("item_id")
        .not_null()
        .indexed()
        .references("item", "article_id"),
    Column::int("level").not_null(),
    Column::text("skill_image"),
    Column::text("icon"),
    Column::text("effect"),
]);

table!(MOUNT, MOUNT_COLUMNS, "mount", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::int("speed"),
    Column::text("taming_method"),
    Column::int("buyable"),
    Column::int("price"),
    Column::text("achievement"),
    Column::int("light_color"),
    Column::int("light_radius"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
    Column::blob("image"),
]);

table!(CHARM, CHARM_COLUMNS, "charm", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("charm_type"),
    Column::text("effect"),
    Column::int("cost"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
    Column::blob("image"),
]);

table!(WORLD, WORLD_COLUMNS, "world", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name").indexed(),
    Column::text("pvp_type"),
    Column::text("location"),
    Column::int("preview"),
    Column::int("experimental"),
    Column::text("online_since"),
    Column::text("offline_since"),
    Column::text("merged_into"),
    Column::int("battleye"),
    Column::text("battleye_type"),
    Column::text("protected_since"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(GAME_UPDATE, GAME_UPDATE_COLUMNS, "game_update", [
    Column::int("article_id").primary_key(),
    Column::text("title").not_null().indexed(),
    Column::int("timestamp"),
    Column::text("name"),
    Column::text("release_date"),
    Column::int("news_id"),
    Column::text("update_type"),
    Column::text("previous"),
    Column::text("next"),
    Column::text("summary"),
    Column::text("version"),
    Column::text("status").not_null().default_value("'active'"),
]);

table!(MAP, MAP_COLUMNS, "map", [
    Column::int("z").primary_key(),
    Column::blob("image"),
]);

table!(RASHID_POSITION, RASHID_POSITION_COLUMNS, "rashid_position", [
    Column::int("day").primary_key(),
    Column::text("city").not_null(),
    Column::int("x").not_null(),
    Column::int("y").not_null(),
    Column::int("z").not_null(),
]);

table!(DATABASE_INFO, DATABASE_INFO_COLUMNS, "database_info", [
    Column::text("key").primary_key(),
    Column::text("value").not_null(),
]);

/// Every table, parents before children so foreign references always point
/// at an existing table.
pub fn all_tables() -> Vec<&'static Table> {
    vec![
        &CREATURE,
        &ITEM,
        &NPC,
        &SPELL,
        &QUEST,
        &HOUSE,
        &ACHIEVEMENT,
        &IMBUEMENT,
        &OUTFIT,
        &MOUNT,
        &CHARM,
        &WORLD,
        &GAME_UPDATE,
        &CREATURE_DROP,
        &CREATURE_ABILITY,
        &CREATURE_MAX_DAMAGE,
        &CREATURE_SOUND,
        &ITEM_ATTRIBUTE,
        &ITEM_SOUND,
        &ITEM_STORE_OFFER,
        &ITEM_KEY,
        &BOOK,
        &NPC_OFFER_BUY,
        &NPC_OFFER_SELL,
        &NPC_SPELL,
        &NPC_DESTINATION,
        &QUEST_REWARD,
        &QUEST_DANGER,
        &IMBUEMENT_MATERIAL,
        &OUTFIT_IMAGE,
        &OUTFIT_QUEST,
        &ITEM_PROFICIENCY_PERK,
        &MAP,
        &RASHID_POSITION,
        &DATABASE_INFO,
    ]
}

/// Create the full schema.
pub fn create_tables(conn: &Connection) -> Result<()> {
    for table in all_tables() {
        conn.execute_batch(&table.create_sql())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_sql_emits_constraints_and_indexes() {
        let sql = CREATURE_DROP.create_sql();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS creature_drop"));
        assert!(sql.contains("creature_id INTEGER NOT NULL REFERENCES creature(article_id)"));
        assert!(sql.contains("min INTEGER NOT NULL DEFAULT 0"));
        assert!(sql.contains("CREATE INDEX IF NOT EXISTS idx_creature_drop_creature_id"));
    }

    #[test]
    fn full_schema_creates_on_memory_database() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count as usize, all_tables().len());
    }

    #[test]
    fn typed_insert_and_get_by_field() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SPELL
            .insert(
                &conn,
                &[
                    ("article_id", Value::Integer(100)),
                    ("title", Value::Text("Light".into())),
                    ("words", Value::Text("utevo lux".into())),
                    ("mana", Value::Integer(20)),
                    ("status", Value::Text("active".into())),
                ],
            )
            .unwrap();
        let row = SPELL
            .get_by_field(&conn, "title", &Value::Text("Light".into()), false)
            .unwrap()
            .unwrap();
        assert_eq!(row["words"], Value::Text("utevo lux".into()));
        assert_eq!(row["article_id"], Value::Integer(100));
    }

    #[test]
    fn unknown_column_is_a_typed_error() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let err = SPELL
            .get_by_field(&conn, "wordz", &Value::Null, false)
            .unwrap_err();
        assert!(matches!(err, TibiaWikiError::UnknownColumn { .. }));
    }

    #[test]
    fn insert_rejects_bad_types_and_nulls() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let err = SPELL
            .insert(
                &conn,
                &[
                    ("article_id", Value::Integer(1)),
                    ("title", Value::Integer(5)),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, TibiaWikiError::TypeMismatch { .. }));

        let err = SPELL
            .insert(
                &conn,
                &[("article_id", Value::Integer(1)), ("title", Value::Null)],
            )
            .unwrap_err();
        assert!(matches!(err, TibiaWikiError::NullViolation { .. }));
    }

    #[test]
    fn search_sorts_and_validates_sort_column() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        for (id, name, points) in [(1, "Annihilator", 5), (2, "Demonbane", 3)] {
            ACHIEVEMENT
                .insert(
                    &conn,
                    &[
                        ("article_id", Value::Integer(id)),
                        ("title", Value::Text(name.into())),
                        ("points", Value::Integer(points)),
                        ("status", Value::Text("active".into())),
                    ],
                )
                .unwrap();
        }
        let rows = ACHIEVEMENT
            .search(
                &conn,
                "status",
                &Value::Text("active".into()),
                Some("points"),
                true,
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["points"], Value::Integer(3));

        assert!(
            ACHIEVEMENT
                .search(&conn, "status", &Value::Null, Some("pointz"), true)
                .is_err()
        );
    }
}
