use crate::error::Result;
use rusqlite::{Connection, params};

#[derive(Debug, Clone, Default)]
pub struct Spell {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub effect: Option<String>,
    pub words: Option<String>,
    pub spell_type: Option<String>,
    pub group_spell: Option<String>,
    pub group_secondary: Option<String>,
    pub group_rune: Option<String>,
    pub element: Option<String>,
    pub mana: Option<i64>,
    pub soul: Option<i64>,
    pub cooldown: Option<i64>,
    pub cooldown2: Option<i64>,
    pub cooldown3: Option<i64>,
    pub cooldown_group: Option<String>,
    pub cooldown_group2: Option<String>,
    pub level: Option<i64>,
    pub premium: bool,
    pub promotion: bool,
    pub wheel: bool,
    pub passive: bool,
    pub knight: bool,
    pub sorcerer: bool,
    pub druid: bool,
    pub paladin: bool,
    pub monk: bool,
    pub version: Option<String>,
    pub status: String,
}

impl Spell {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO spell (
                article_id, title, timestamp, name, effect, words, spell_type,
                group_spell, group_secondary, group_rune, element, mana, soul,
                cooldown, cooldown2, cooldown3, cooldown_group, cooldown_group2,
                level, premium, promotion, wheel, passive, knight, sorcerer,
                druid, paladin, monk, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                      ?25, ?26, ?27, ?28, ?29, ?30)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.effect,
                self.words,
                self.spell_type,
                self.group_spell,
                self.group_secondary,
                self.group_rune,
                self.element,
                self.mana,
                self.soul,
                self.cooldown,
                self.cooldown2,
                self.cooldown3,
                self.cooldown_group,
                self.cooldown_group2,
                self.level,
                self.premium,
                self.promotion,
                self.wheel,
                self.passive,
                self.knight,
                self.sorcerer,
                self.druid,
                self.paladin,
                self.monk,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}
