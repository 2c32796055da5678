use crate::error::Result;
use crate::models::best_effort;
use rusqlite::{Connection, params};

/// One entry of the item's normalised attribute bag. The attribute-name
/// vocabulary is closed; see the item parser.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemStoreOffer {
    pub price: i64,
    pub currency: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Item {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub actual_name: Option<String>,
    pub plural: Option<String>,
    pub article: Option<String>,
    pub marketable: bool,
    pub stackable: bool,
    pub pickupable: bool,
    pub immobile: bool,
    pub value_sell: Option<i64>,
    pub value_buy: Option<i64>,
    pub weight: Option<f64>,
    pub flavor_text: Option<String>,
    pub item_class: Option<String>,
    pub type_primary: Option<String>,
    pub type_secondary: Option<String>,
    pub light_color: Option<i64>,
    pub light_radius: Option<i64>,
    pub client_id: Option<i64>,
    pub version: Option<String>,
    pub status: String,
    pub attributes: Vec<ItemAttribute>,
    pub sounds: Vec<String>,
    pub store_offers: Vec<ItemStoreOffer>,
}

impl Item {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO item (
                article_id, title, timestamp, name, actual_name, plural, article,
                marketable, stackable, pickupable, immobile, value_sell, value_buy,
                weight, flavor_text, item_class, type_primary, type_secondary,
                light_color, light_radius, client_id, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.actual_name,
                self.plural,
                self.article,
                self.marketable,
                self.stackable,
                self.pickupable,
                self.immobile,
                self.value_sell,
                self.value_buy,
                self.weight,
                self.flavor_text,
                self.item_class,
                self.type_primary,
                self.type_secondary,
                self.light_color,
                self.light_radius,
                self.client_id,
                self.version,
                self.status,
            ],
        )?;

        for attribute in &self.attributes {
            best_effort(
                conn.execute(
                    "INSERT INTO item_attribute (item_id, name, value) VALUES (?1, ?2, ?3)",
                    params![self.article_id, attribute.name, attribute.value],
                ),
                "item_attribute",
            );
        }
        for sound in &self.sounds {
            best_effort(
                conn.execute(
                    "INSERT INTO item_sound (item_id, content) VALUES (?1, ?2)",
                    params![self.article_id, sound],
                ),
                "item_sound",
            );
        }
        for offer in &self.store_offers {
            best_effort(
                conn.execute(
                    "INSERT INTO item_store_offer (item_id, price, currency, amount)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![self.article_id, offer.price, offer.currency, offer.amount],
                ),
                "item_store_offer",
            );
        }
        Ok(())
    }
}

/// A key article. Resolves to the generic "<material> Key" item row when
/// that item exists.
#[derive(Debug, Clone, Default)]
pub struct Key {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub number: Option<i64>,
    pub material: Option<String>,
    pub location: Option<String>,
    pub origin: Option<String>,
    pub notes: Option<String>,
    pub version: Option<String>,
    pub status: String,
}

impl Key {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        let item_title = self.material.as_deref().map(|m| format!("{m} Key"));
        conn.execute(
            "INSERT INTO item_key (
                article_id, title, timestamp, number, item_id, material, location,
                origin, notes, version, status
            ) VALUES (?1, ?2, ?3, ?4,
                      (SELECT article_id FROM item WHERE title = ?5),
                      ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.number,
                item_title,
                self.material,
                self.location,
                self.origin,
                self.notes,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}

/// A book article. `book_type` names the physical book item the text is
/// written in, which resolves to an item row when present.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub book_type: Option<String>,
    pub author: Option<String>,
    pub prev_book: Option<String>,
    pub next_book: Option<String>,
    pub location: Option<String>,
    pub blurb: Option<String>,
    pub text: Option<String>,
    pub version: Option<String>,
    pub status: String,
}

impl Book {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO book (
                article_id, title, timestamp, name, book_type, item_id, author,
                prev_book, next_book, location, blurb, text, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5,
                      (SELECT article_id FROM item WHERE title = ?5),
                      ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.book_type,
                self.author,
                self.prev_book,
                self.next_book,
                self.location,
                self.blurb,
                self.text,
                self.version,
                self.status,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    #[test]
    fn item_children_are_written() {
        let conn = connection();
        let item = Item {
            article_id: 5,
            title: "Magic Sword".into(),
            status: "active".into(),
            attributes: vec![
                ItemAttribute {
                    name: "attack".into(),
                    value: "48".into(),
                },
                ItemAttribute {
                    name: "level".into(),
                    value: "80".into(),
                },
            ],
            store_offers: vec![ItemStoreOffer {
                price: 50,
                currency: "Tibia Coin".into(),
                amount: 1,
            }],
            ..Default::default()
        };
        item.insert(&conn).unwrap();
        let attributes: i64 = conn
            .query_row("SELECT COUNT(*) FROM item_attribute WHERE item_id = 5", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(attributes, 2);
    }

    #[test]
    fn key_resolves_material_item() {
        let conn = connection();
        conn.execute(
            "INSERT INTO item (article_id, title, status) VALUES (7, 'Silver Key', 'active')",
            [],
        )
        .unwrap();
        let key = Key {
            article_id: 100,
            title: "Key 3700".into(),
            number: Some(3700),
            material: Some("Silver".into()),
            status: "active".into(),
            ..Default::default()
        };
        key.insert(&conn).unwrap();
        let item_id: Option<i64> = conn
            .query_row("SELECT item_id FROM item_key WHERE article_id = 100", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(item_id, Some(7));
    }
}
