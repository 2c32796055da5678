use crate::error::Result;
use crate::models::best_effort;
use rusqlite::{Connection, params};

/// One buy or sell offer. Titles are resolved to item ids at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcOffer {
    pub item_title: String,
    pub currency_title: String,
    pub value: i64,
}

/// One taught spell with its per-vocation flags. Duplicate appearances of
/// the same spell are OR-folded by the parser before insertion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NpcSpell {
    pub spell_title: String,
    pub knight: bool,
    pub sorcerer: bool,
    pub druid: bool,
    pub paladin: bool,
    pub monk: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NpcDestination {
    pub name: String,
    pub price: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Npc {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub races: Option<String>,
    pub jobs: Option<String>,
    pub city: Option<String>,
    pub subarea: Option<String>,
    pub location: Option<String>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub z: Option<i64>,
    pub version: Option<String>,
    pub status: String,
    pub buy_offers: Vec<NpcOffer>,
    pub sell_offers: Vec<NpcOffer>,
    pub teaches: Vec<NpcSpell>,
    pub destinations: Vec<NpcDestination>,
}

impl Npc {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO npc (
                article_id, title, timestamp, name, gender, races, jobs, city,
                subarea, location, x, y, z, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.gender,
                self.races,
                self.jobs,
                self.city,
                self.subarea,
                self.location,
                self.x,
                self.y,
                self.z,
                self.version,
                self.status,
            ],
        )?;

        for (table, offers) in [
            ("npc_offer_buy", &self.buy_offers),
            ("npc_offer_sell", &self.sell_offers),
        ] {
            let sql = format!(
                "INSERT INTO {table} (npc_id, item_id, item_title, currency_id, currency_title, value)
                 VALUES (?1, (SELECT article_id FROM item WHERE title = ?2), ?2,
                         (SELECT article_id FROM item WHERE title = ?3), ?3, ?4)"
            );
            for offer in offers.iter() {
                best_effort(
                    conn.execute(
                        &sql,
                        params![
                            self.article_id,
                            offer.item_title,
                            offer.currency_title,
                            offer.value
                        ],
                    ),
                    table,
                );
            }
        }

        for spell in &self.teaches {
            best_effort(
                conn.execute(
                    "INSERT INTO npc_spell (
                        npc_id, spell_id, spell_title, knight, sorcerer, druid, paladin, monk
                    ) VALUES (?1, (SELECT article_id FROM spell WHERE title = ?2), ?2,
                              ?3, ?4, ?5, ?6, ?7)",
                    params![
                        self.article_id,
                        spell.spell_title,
                        spell.knight,
                        spell.sorcerer,
                        spell.druid,
                        spell.paladin,
                        spell.monk,
                    ],
                ),
                "npc_spell",
            );
        }

        for destination in &self.destinations {
            best_effort(
                conn.execute(
                    "INSERT INTO npc_destination (npc_id, name, price, notes)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        self.article_id,
                        destination.name,
                        destination.price,
                        destination.notes
                    ],
                ),
                "npc_destination",
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn offers_resolve_item_and_currency() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO item (article_id, title, status) VALUES
             (1, 'Gold Coin', 'active'), (2, 'Sword', 'active')",
            [],
        )
        .unwrap();

        let npc = Npc {
            article_id: 50,
            title: "Sam".into(),
            status: "active".into(),
            sell_offers: vec![NpcOffer {
                item_title: "Sword".into(),
                currency_title: "Gold Coin".into(),
                value: 85,
            }],
            destinations: vec![NpcDestination {
                name: "Thais".into(),
                price: 110,
                notes: None,
            }],
            ..Default::default()
        };
        npc.insert(&conn).unwrap();

        let (item_id, currency_id): (Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT item_id, currency_id FROM npc_offer_sell WHERE npc_id = 50",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(item_id, Some(2));
        assert_eq!(currency_id, Some(1));
    }
}
