//! Typed records for every entity the generator writes, with per-entity
//! insert logic.
//!
//! Child rows that reference another entity by title use deferred
//! resolution: the insert embeds `(SELECT article_id FROM <parent> WHERE
//! title = ?)` so the lookup happens inside the statement, after the parent
//! tables were populated by an earlier pipeline stage. A child row that
//! trips a constraint is skipped, not fatal; the wiki data is imperfect.

pub mod achievement;
pub mod creature;
pub mod house;
pub mod imbuement;
pub mod item;
pub mod misc;
pub mod npc;
pub mod outfit;
pub mod quest;
pub mod spell;

pub use achievement::Achievement;
pub use creature::{Creature, CreatureAbility, CreatureDrop, CreatureMaxDamage};
pub use house::House;
pub use imbuement::{Imbuement, ImbuementMaterial};
pub use item::{Book, Item, ItemAttribute, ItemStoreOffer, Key};
pub use misc::{Charm, GameUpdate, Mount, RASHID_POSITIONS, RashidPosition, World};
pub use npc::{Npc, NpcDestination, NpcOffer, NpcSpell};
pub use outfit::{Outfit, OutfitQuest};
pub use quest::Quest;
pub use spell::Spell;

/// Swallow a failed child-row insert. Missing referents and duplicate rows
/// are expected in wiki data; they are logged and counted upstream.
pub(crate) fn best_effort(result: rusqlite::Result<usize>, context: &str) {
    if let Err(e) = result {
        tracing::debug!("Skipped child row ({context}): {e}");
    }
}
