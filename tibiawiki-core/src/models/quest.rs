use crate::error::Result;
use crate::models::best_effort;
use rusqlite::{Connection, params};

#[derive(Debug, Clone, Default)]
pub struct Quest {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub location: Option<String>,
    pub rookgaard: bool,
    pub quest_type: Option<String>,
    pub quest_log: bool,
    pub legend: Option<String>,
    pub level_required: Option<i64>,
    pub level_recommended: Option<i64>,
    pub active_time: Option<String>,
    pub estimated_time: Option<String>,
    pub premium: bool,
    pub version: Option<String>,
    pub status: String,
    pub rewards: Vec<String>,
    pub dangers: Vec<String>,
}

impl Quest {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO quest (
                article_id, title, timestamp, name, location, rookgaard,
                quest_type, quest_log, legend, level_required, level_recommended,
                active_time, estimated_time, premium, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.location,
                self.rookgaard,
                self.quest_type,
                self.quest_log,
                self.legend,
                self.level_required,
                self.level_recommended,
                self.active_time,
                self.estimated_time,
                self.premium,
                self.version,
                self.status,
            ],
        )?;

        for reward in &self.rewards {
            best_effort(
                conn.execute(
                    "INSERT INTO quest_reward (quest_id, item_id, item_title)
                     VALUES (?1, (SELECT article_id FROM item WHERE title = ?2), ?2)",
                    params![self.article_id, reward],
                ),
                "quest_reward",
            );
        }
        for danger in &self.dangers {
            best_effort(
                conn.execute(
                    "INSERT INTO quest_danger (quest_id, creature_id, creature_title)
                     VALUES (?1, (SELECT article_id FROM creature WHERE title = ?2), ?2)",
                    params![self.article_id, danger],
                ),
                "quest_danger",
            );
        }
        Ok(())
    }
}
