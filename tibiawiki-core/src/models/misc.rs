//! Flat entities without child tables, plus the static Rashid schedule.

use crate::error::Result;
use rusqlite::{Connection, params};

#[derive(Debug, Clone, Default)]
pub struct Mount {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub speed: Option<i64>,
    pub taming_method: Option<String>,
    pub buyable: bool,
    pub price: Option<i64>,
    pub achievement: Option<String>,
    pub light_color: Option<i64>,
    pub light_radius: Option<i64>,
    pub version: Option<String>,
    pub status: String,
}

impl Mount {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO mount (
                article_id, title, timestamp, name, speed, taming_method,
                buyable, price, achievement, light_color, light_radius,
                version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.speed,
                self.taming_method,
                self.buyable,
                self.price,
                self.achievement,
                self.light_color,
                self.light_radius,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Charm {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub charm_type: Option<String>,
    pub effect: Option<String>,
    pub cost: Option<i64>,
    pub version: Option<String>,
    pub status: String,
}

impl Charm {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO charm (
                article_id, title, timestamp, name, charm_type, effect, cost,
                version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.charm_type,
                self.effect,
                self.cost,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct World {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub pvp_type: Option<String>,
    pub location: Option<String>,
    pub preview: bool,
    pub experimental: bool,
    pub online_since: Option<String>,
    pub offline_since: Option<String>,
    pub merged_into: Option<String>,
    pub battleye: bool,
    pub battleye_type: Option<String>,
    pub protected_since: Option<String>,
    pub version: Option<String>,
    pub status: String,
}

impl World {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO world (
                article_id, title, timestamp, name, pvp_type, location, preview,
                experimental, online_since, offline_since, merged_into,
                battleye, battleye_type, protected_since, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                      ?14, ?15, ?16)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.pvp_type,
                self.location,
                self.preview,
                self.experimental,
                self.online_since,
                self.offline_since,
                self.merged_into,
                self.battleye,
                self.battleye_type,
                self.protected_since,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub news_id: Option<i64>,
    pub update_type: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub summary: Option<String>,
    pub version: Option<String>,
    pub status: String,
}

impl GameUpdate {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO game_update (
                article_id, title, timestamp, name, release_date, news_id,
                update_type, previous, next, summary, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.release_date,
                self.news_id,
                self.update_type,
                self.previous,
                self.next,
                self.summary,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}

/// Where Rashid stands on a given weekday. `day` is 0 for Monday.
#[derive(Debug, Clone, Copy)]
pub struct RashidPosition {
    pub day: i64,
    pub city: &'static str,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

pub const RASHID_POSITIONS: [RashidPosition; 7] = [
    RashidPosition { day: 0, city: "Svargrond", x: 32212, y: 31150, z: 7 },
    RashidPosition { day: 1, city: "Liberty Bay", x: 32285, y: 32892, z: 7 },
    RashidPosition { day: 2, city: "Port Hope", x: 32527, y: 32784, z: 7 },
    RashidPosition { day: 3, city: "Ankrahmun", x: 33068, y: 32879, z: 7 },
    RashidPosition { day: 4, city: "Darashia", x: 33213, y: 32454, z: 1 },
    RashidPosition { day: 5, city: "Edron", x: 33171, y: 31813, z: 7 },
    RashidPosition { day: 6, city: "Carlin", x: 32317, y: 31784, z: 7 },
];

impl RashidPosition {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO rashid_position (day, city, x, y, z) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.day, self.city, self.x, self.y, self.z],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn rashid_schedule_covers_the_week() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        for position in RASHID_POSITIONS {
            position.insert(&conn).unwrap();
        }
        let days: i64 = conn
            .query_row("SELECT COUNT(DISTINCT day) FROM rashid_position", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(days, 7);
        let friday: String = conn
            .query_row("SELECT city FROM rashid_position WHERE day = 4", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(friday, "Darashia");
    }
}
