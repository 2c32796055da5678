use crate::error::Result;
use rusqlite::{Connection, params};

#[derive(Debug, Clone, Default)]
pub struct House {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub house_id: Option<i64>,
    pub name: Option<String>,
    pub guildhall: bool,
    pub city: Option<String>,
    pub street: Option<String>,
    pub beds: Option<i64>,
    pub rent: Option<i64>,
    pub size: Option<i64>,
    pub rooms: Option<i64>,
    pub floors: Option<i64>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub z: Option<i64>,
    pub version: Option<String>,
    pub status: String,
}

impl House {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO house (
                article_id, title, timestamp, house_id, name, guildhall, city,
                street, beds, rent, size, rooms, floors, x, y, z, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16, ?17, ?18)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.house_id,
                self.name,
                self.guildhall,
                self.city,
                self.street,
                self.beds,
                self.rent,
                self.size,
                self.rooms,
                self.floors,
                self.x,
                self.y,
                self.z,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}
