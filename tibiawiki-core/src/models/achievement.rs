use crate::error::Result;
use rusqlite::{Connection, params};

#[derive(Debug, Clone, Default)]
pub struct Achievement {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub grade: Option<i64>,
    pub points: Option<i64>,
    pub description: Option<String>,
    pub spoiler: Option<String>,
    pub secret: bool,
    pub premium: bool,
    pub achievement_id: Option<i64>,
    pub version: Option<String>,
    pub status: String,
}

impl Achievement {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO achievement (
                article_id, title, timestamp, name, grade, points, description,
                spoiler, secret, premium, achievement_id, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.grade,
                self.points,
                self.description,
                self.spoiler,
                self.secret,
                self.premium,
                self.achievement_id,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}
