//! Flat entities: mounts, charms, game worlds and client updates.

use crate::api::Article;
use crate::error::Result;
use crate::models::{Charm, GameUpdate, Mount, World};
use crate::parsers::{
    ParserContext, boolean, cleaned, display_name, integer, required_display_name, version,
};
use crate::wikitext::{clean_links, client_color_to_rgb, find_template};

pub fn parse_mount(article: &Article, context: &ParserContext) -> Result<Option<Mount>> {
    let Some(infobox) = find_template(&article.content, "Infobox Mount", false) else {
        return Ok(None);
    };
    let mount = Mount {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        speed: integer(&infobox, "speed"),
        taming_method: infobox
            .get("taming_method")
            .map(|v| clean_links(v, true))
            .filter(|v| !v.is_empty()),
        buyable: boolean(&infobox, "bought"),
        price: integer(&infobox, "price"),
        achievement: cleaned(&infobox, "achievement"),
        light_color: integer(&infobox, "lightcolor").map(client_color_to_rgb),
        light_radius: integer(&infobox, "lightradius"),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(mount))
}

pub fn parse_charm(article: &Article, context: &ParserContext) -> Result<Option<Charm>> {
    let Some(infobox) = find_template(&article.content, "Infobox Charm", false) else {
        return Ok(None);
    };
    let charm = Charm {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        charm_type: cleaned(&infobox, "type"),
        effect: cleaned(&infobox, "effect"),
        cost: integer(&infobox, "cost"),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(charm))
}

pub fn parse_world(article: &Article, context: &ParserContext) -> Result<Option<World>> {
    let Some(infobox) = find_template(&article.content, "Infobox World", false) else {
        return Ok(None);
    };
    let world = World {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: Some(required_display_name(&infobox)?),
        pvp_type: cleaned(&infobox, "pvptype"),
        location: cleaned(&infobox, "location"),
        preview: boolean(&infobox, "preview"),
        experimental: boolean(&infobox, "experimental"),
        online_since: cleaned(&infobox, "online"),
        offline_since: cleaned(&infobox, "offline"),
        merged_into: cleaned(&infobox, "mergedinto"),
        battleye: boolean(&infobox, "battleye"),
        battleye_type: cleaned(&infobox, "battleyetype"),
        protected_since: cleaned(&infobox, "protectedsince"),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(world))
}

pub fn parse_update(article: &Article, context: &ParserContext) -> Result<Option<GameUpdate>> {
    let Some(infobox) = find_template(&article.content, "Infobox Update", false) else {
        return Ok(None);
    };
    let update = GameUpdate {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        name: display_name(&infobox),
        release_date: cleaned(&infobox, "date"),
        news_id: integer(&infobox, "newsid"),
        update_type: cleaned(&infobox, "type"),
        previous: cleaned(&infobox, "previous"),
        next: cleaned(&infobox, "next"),
        summary: cleaned(&infobox, "summary"),
        version: cleaned(&infobox, "version").or_else(|| version(&infobox)),
        status: context.status(&article.title),
    };
    Ok(Some(update))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, content: &str) -> Article {
        Article {
            article_id: 3,
            title: title.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: content.to_string(),
        }
    }

    #[test]
    fn mount_light_color_uses_palette() {
        let mount = parse_mount(
            &article(
                "Shadow Draptor",
                "{{Infobox Mount|name=Shadow Draptor|speed=20|bought=yes|price=870|lightcolor=215}}",
            ),
            &ParserContext::new(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(mount.light_color, Some(0xFFFFFF));
        assert!(mount.buyable);
    }

    #[test]
    fn world_flags() {
        let world = parse_world(
            &article(
                "Antica",
                "{{Infobox World|name=Antica|pvptype=Open PvP|location=Europe\
                 |battleye=yes|battleyetype=green|online=1997}}",
            ),
            &ParserContext::new(),
        )
        .unwrap()
        .unwrap();
        assert!(world.battleye);
        assert_eq!(world.online_since.as_deref(), Some("1997"));
    }
}
