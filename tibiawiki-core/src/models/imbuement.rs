use crate::error::Result;
use crate::models::best_effort;
use rusqlite::{Connection, params};

/// One astral source: `amount` units of the named item.
#[derive(Debug, Clone, PartialEq)]
pub struct ImbuementMaterial {
    pub item_title: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Imbuement {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub tier: Option<String>,
    pub imbuement_type: Option<String>,
    pub category: Option<String>,
    pub effect: Option<String>,
    pub slots: Option<String>,
    pub version: Option<String>,
    pub status: String,
    pub materials: Vec<ImbuementMaterial>,
}

impl Imbuement {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO imbuement (
                article_id, title, timestamp, name, tier, imbuement_type,
                category, effect, slots, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.tier,
                self.imbuement_type,
                self.category,
                self.effect,
                self.slots,
                self.version,
                self.status,
            ],
        )?;

        for material in &self.materials {
            best_effort(
                conn.execute(
                    "INSERT INTO imbuement_material (imbuement_id, item_id, item_title, amount)
                     VALUES (?1, (SELECT article_id FROM item WHERE title = ?2), ?2, ?3)",
                    params![self.article_id, material.item_title, material.amount],
                ),
                "imbuement_material",
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
    fn materials_resolve_by_title() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO item (article_id, title, status) VALUES (20, 'Cultish Robe', 'active')",
            [],
        )
        .unwrap();

        let imbuement = Imbuement {
            article_id: 300,
            title: "Basic Bash".into(),
            status: "active".into(),
            materials: vec![ImbuementMaterial {
                item_title: "Cultish Robe".into(),
                amount: 20,
            }],
            ..Default::default()
        };
        imbuement.insert(&conn).unwrap();

        let (item_id, amount): (Option<i64>, i64) = conn
            .query_row(
                "SELECT item_id, amount FROM imbuement_material WHERE imbuement_id = 300",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(item_id, Some(20));
        assert_eq!(amount, 20);
    }
}
