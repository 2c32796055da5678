use crate::api::Article;
use crate::error::Result;
use crate::models::House;
use crate::parsers::{ParserContext, cleaned, integer, required_display_name, version};
use crate::wikitext::{convert_tibiawiki_position, find_template};

const TEMPLATE: &str = "Infobox Building";

pub fn parse(article: &Article, context: &ParserContext) -> Result<Option<House>> {
    let Some(infobox) = find_template(&article.content, TEMPLATE, false) else {
        return Ok(None);
    };

    let house = House {
        article_id: article.article_id,
        title: article.title.clone(),
        timestamp: article.timestamp.timestamp(),
        house_id: integer(&infobox, "houseid"),
        name: Some(required_display_name(&infobox)?),
        guildhall: infobox
            .get("type")
            .map(|t| t.trim().eq_ignore_ascii_case("guildhall"))
            .unwrap_or(false),
        city: cleaned(&infobox, "city"),
        street: cleaned(&infobox, "street"),
        beds: integer(&infobox, "beds"),
        rent: integer(&infobox, "rent"),
        size: integer(&infobox, "size"),
        rooms: integer(&infobox, "rooms"),
        floors: integer(&infobox, "floors"),
        x: infobox.get("posx").map(convert_tibiawiki_position),
        y: infobox.get("posy").map(convert_tibiawiki_position),
        z: integer(&infobox, "posz"),
        version: version(&infobox),
        status: context.status(&article.title),
    };
    Ok(Some(house))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn positions_use_base_256_decoding() {
        let article = Article {
            article_id: 88,
            title: "Coastwood 1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            content: "{{Infobox Building|name=Coastwood 1|houseid=10001|type=house\
                |city=Ab'Dendriel|rent=532|size=16|beds=2|posx=126.135|posy=121.247|posz=6}}"
                .to_string(),
        };
        let house = parse(&article, &ParserContext::new()).unwrap().unwrap();
        assert_eq!(house.house_id, Some(10001));
        assert!(!house.guildhall);
        assert_eq!(house.x, Some((126 << 8) + 135));
        assert_eq!(house.y, Some((121 << 8) + 247));
        assert_eq!(house.z, Some(6));
    }
}
