use crate::error::Result;
use crate::models::best_effort;
use rusqlite::{Connection, params};

/// One loot entry from a creature article. `chance` stays empty until the
/// loot-statistics post-task fills it in.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatureDrop {
    pub item_title: String,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatureAbility {
    pub name: String,
    pub effect: String,
    pub element: String,
}

/// Per-element maximum damage breakdown. `total` excludes summons and
/// manadrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatureMaxDamage {
    pub physical: Option<i64>,
    pub earth: Option<i64>,
    pub fire: Option<i64>,
    pub ice: Option<i64>,
    pub energy: Option<i64>,
    pub death: Option<i64>,
    pub holy: Option<i64>,
    pub drown: Option<i64>,
    pub lifedrain: Option<i64>,
    pub manadrain: Option<i64>,
    pub summons: Option<i64>,
    pub total: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Creature {
    pub article_id: i64,
    pub title: String,
    pub timestamp: i64,
    pub name: Option<String>,
    pub article: Option<String>,
    pub plural: Option<String>,
    pub library_race: Option<String>,
    pub creature_class: Option<String>,
    pub type_primary: Option<String>,
    pub type_secondary: Option<String>,
    pub bestiary_class: Option<String>,
    pub bestiary_level: Option<String>,
    pub bestiary_occurrence: Option<String>,
    pub hitpoints: Option<i64>,
    pub experience: Option<i64>,
    pub armor: Option<i64>,
    pub mitigation: Option<i64>,
    pub speed: Option<i64>,
    pub runs_at: Option<i64>,
    pub summon_cost: Option<i64>,
    pub convince_cost: Option<i64>,
    pub illusionable: bool,
    pub pushable: bool,
    pub push_objects: bool,
    pub sees_invisible: bool,
    pub paralysable: bool,
    pub boss: bool,
    pub modifier_physical: Option<i64>,
    pub modifier_earth: Option<i64>,
    pub modifier_fire: Option<i64>,
    pub modifier_ice: Option<i64>,
    pub modifier_energy: Option<i64>,
    pub modifier_death: Option<i64>,
    pub modifier_holy: Option<i64>,
    pub modifier_drown: Option<i64>,
    pub modifier_lifedrain: Option<i64>,
    pub modifier_healing: Option<i64>,
    pub walks_through: Option<String>,
    pub walks_around: Option<String>,
    pub location: Option<String>,
    pub version: Option<String>,
    pub status: String,
    pub loot: Vec<CreatureDrop>,
    pub abilities: Vec<CreatureAbility>,
    pub max_damage: Option<CreatureMaxDamage>,
    pub sounds: Vec<String>,
}

impl Creature {
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO creature (
                article_id, title, timestamp, name, article, plural, library_race,
                creature_class, type_primary, type_secondary, bestiary_class,
                bestiary_level, bestiary_occurrence, hitpoints, experience, armor,
                mitigation, speed, runs_at, summon_cost, convince_cost, illusionable,
                pushable, push_objects, sees_invisible, paralysable, boss,
                modifier_physical, modifier_earth, modifier_fire, modifier_ice,
                modifier_energy, modifier_death, modifier_holy, modifier_drown,
                modifier_lifedrain, modifier_healing, walks_through, walks_around,
                location, version, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                      ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                      ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38,
                      ?39, ?40, ?41, ?42)",
            params![
                self.article_id,
                self.title,
                self.timestamp,
                self.name,
                self.article,
                self.plural,
                self.library_race,
                self.creature_class,
                self.type_primary,
                self.type_secondary,
                self.bestiary_class,
                self.bestiary_level,
                self.bestiary_occurrence,
                self.hitpoints,
                self.experience,
                self.armor,
                self.mitigation,
                self.speed,
                self.runs_at,
                self.summon_cost,
                self.convince_cost,
                self.illusionable,
                self.pushable,
                self.push_objects,
                self.sees_invisible,
                self.paralysable,
                self.boss,
                self.modifier_physical,
                self.modifier_earth,
                self.modifier_fire,
                self.modifier_ice,
                self.modifier_energy,
                self.modifier_death,
                self.modifier_holy,
                self.modifier_drown,
                self.modifier_lifedrain,
                self.modifier_healing,
                self.walks_through,
                self.walks_around,
                self.location,
                self.version,
                self.status,
            ],
        )?;

        for drop in &self.loot {
            best_effort(
                conn.execute(
                    "INSERT INTO creature_drop (creature_id, item_id, item_title, min, max)
                     VALUES (?1, (SELECT article_id FROM item WHERE title = ?2), ?2, ?3, ?4)",
                    params![self.article_id, drop.item_title, drop.min, drop.max],
                ),
                "creature_drop",
            );
        }
        for ability in &self.abilities {
            best_effort(
                conn.execute(
                    "INSERT INTO creature_ability (creature_id, name, effect, element)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![self.article_id, ability.name, ability.effect, ability.element],
                ),
                "creature_ability",
            );
        }
        if let Some(damage) = &self.max_damage {
            best_effort(
                conn.execute(
                    "INSERT INTO creature_max_damage (
                        creature_id, physical, earth, fire, ice, energy, death, holy,
                        drown, lifedrain, manadrain, summons, total
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                    params![
                        self.article_id,
                        damage.physical,
                        damage.earth,
                        damage.fire,
                        damage.ice,
                        damage.energy,
                        damage.death,
                        damage.holy,
                        damage.drown,
                        damage.lifedrain,
                        damage.manadrain,
                        damage.summons,
                        damage.total,
                    ],
                ),
                "creature_max_damage",
            );
        }
        for sound in &self.sounds {
            best_effort(
                conn.execute(
                    "INSERT INTO creature_sound (creature_id, content) VALUES (?1, ?2)",
                    params![self.article_id, sound],
                ),
                "creature_sound",
            );
        }
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
    fn insert_resolves_drop_items_by_title() {
        let conn = connection();
        conn.execute(
            "INSERT INTO item (article_id, title, status) VALUES (10, 'Gold Coin', 'active')",
            [],
        )
        .unwrap();

        let creature = Creature {
            article_id: 1,
            title: "Dragon".into(),
            status: "active".into(),
            loot: vec![
                CreatureDrop {
                    item_title: "Gold Coin".into(),
                    min: 0,
                    max: 80,
                },
                CreatureDrop {
                    item_title: "Unobtainium".into(),
                    min: 0,
                    max: 1,
                },
            ],
            ..Default::default()
        };
        creature.insert(&conn).unwrap();

        let (resolved, unresolved): (Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT
                    (SELECT item_id FROM creature_drop WHERE item_title = 'Gold Coin'),
                    (SELECT item_id FROM creature_drop WHERE item_title = 'Unobtainium')",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(resolved, Some(10));
        assert_eq!(unresolved, None);
    }

    #[test]
    fn insert_writes_children() {
        let conn = connection();
        let creature = Creature {
            article_id: 2,
            title: "Demon".into(),
            status: "active".into(),
            abilities: vec![CreatureAbility {
                name: "Fire Wave".into(),
                effect: "100-250".into(),
                element: "fire".into(),
            }],
            max_damage: Some(CreatureMaxDamage {
                physical: Some(500),
                fire: Some(250),
                total: 750,
                ..Default::default()
            }),
            sounds: vec!["MUHAHAHAHA!".into()],
            ..Default::default()
        };
        creature.insert(&conn).unwrap();

        let abilities: i64 = conn
            .query_row("SELECT COUNT(*) FROM creature_ability", [], |r| r.get(0))
            .unwrap();
        let total: i64 = conn
            .query_row(
                "SELECT total FROM creature_max_damage WHERE creature_id = 2",
                [],
                |r| r.get(0),
            )
            .unwrap();
        let sounds: i64 = conn
            .query_row("SELECT COUNT(*) FROM creature_sound", [], |r| r.get(0))
            .unwrap();
        assert_eq!(abilities, 1);
        assert_eq!(total, 750);
        assert_eq!(sounds, 1);
    }
}
