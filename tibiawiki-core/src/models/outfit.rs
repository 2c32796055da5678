use crate::error::Result;
use crate::models::best_effort;
use rusqlite::{Connection, params};

/// Quest linked from an outfit article. `quest_type` is either "outfit" or
/// "addon" depending on which list of the infobox it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct OutfitQuest {
    pub quest_title: String,
    pub quest_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct Outfit {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub outfit_type: Option<String>,
    pub premium: bool,
    pub tournament: bool,
    pub bought: bool,
    pub full_price: Option<i64>,
    pub achievement: Option<String>,
    pub version: Option<String>,
    pub status: String,
    pub quests: Vec<OutfitQuest>,
}

impl Outfit {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO outfit (
                article_id, title, timestamp, name, outfit_type, premium,
                tournament, bought, full_price, achievement, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.outfit_type,
                self.premium,
                self.tournament,
                self.bought,
                self.full_price,
                self.achievement,
                self.version,
                self.status,
            ],
        )?;

        for quest in &self.quests {
            best_effort(
                conn.execute(
                    "INSERT INTO outfit_quest (outfit_id, quest_id, quest_title, quest_type)
                     VALUES (?1, (SELECT article_id FROM quest WHERE title = ?2), ?2, ?3)",
                    params![self.article_id, quest.quest_title, quest.quest_type],
                ),
                "outfit_quest",
            );
        }
        Ok(())
    }
}
