use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Lower-case alias -> canonical celestial point name
static PLANET_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("soleil", "Soleil"),
        ("sun", "Soleil"),
        ("lune", "Lune"),
        ("moon", "Lune"),
        ("ascendant", "Ascendant"),
        ("asc", "Ascendant"),
        ("milieu du ciel", "Milieu du Ciel"),
        ("mi-ciel", "Milieu du Ciel"),
        ("mc", "Milieu du Ciel"),
        ("midheaven", "Milieu du Ciel"),
        ("mercure", "Mercure"),
        ("mercury", "Mercure"),
        ("vénus", "Vénus"),
        ("venus", "Vénus"),
        ("mars", "Mars"),
        ("jupiter", "Jupiter"),
        ("saturne", "Saturne"),
        ("saturn", "Saturne"),
        ("uranus", "Uranus"),
        ("neptune", "Neptune"),
        ("pluton", "Pluton"),
        ("pluto", "Pluton"),
        ("nœud nord", "Nœud Nord"),
        ("noeud nord", "Nœud Nord"),
        ("nœud lunaire nord", "Nœud Nord"),
        ("noeud lunaire nord", "Nœud Nord"),
        ("north node", "Nœud Nord"),
        ("true node", "Nœud Nord"),
        ("nœud sud", "Nœud Sud"),
        ("noeud sud", "Nœud Sud"),
        ("nœud lunaire sud", "Nœud Sud"),
        ("noeud lunaire sud", "Nœud Sud"),
        ("south node", "Nœud Sud"),
        ("chiron", "Chiron"),
        ("vertex", "Vertex"),
        ("lilith", "Lilith"),
        ("lune noire", "Lilith"),
        ("black moon", "Lilith"),
        ("black moon lilith", "Lilith"),
        ("pallas", "Pallas"),
        ("pallas athéna", "Pallas"),
        ("pallas athena", "Pallas"),
        ("vesta", "Vesta"),
        ("cérès", "Cérès"),
        ("ceres", "Cérès"),
        ("cerès", "Cérès"),
        ("part de fortune", "Part de Fortune"),
        ("part of fortune", "Part de Fortune"),
        ("pars fortuna", "Part de Fortune"),
        ("fortune", "Part de Fortune"),
        ("junon", "Junon"),
        ("juno", "Junon"),
    ]
    .into_iter()
    .collect()
});

/// Lower-case alias -> canonical zodiac sign
static SIGN_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("bélier", "Bélier"),
        ("belier", "Bélier"),
        ("aries", "Bélier"),
        ("taureau", "Taureau"),
        ("taurus", "Taureau"),
        ("gémeaux", "Gémeaux"),
        ("gemeaux", "Gémeaux"),
        ("gemini", "Gémeaux"),
        ("cancer", "Cancer"),
        ("lion", "Lion"),
        ("leo", "Lion"),
        ("vierge", "Vierge"),
        ("virgo", "Vierge"),
        ("balance", "Balance"),
        ("libra", "Balance"),
        ("scorpion", "Scorpion"),
        ("scorpio", "Scorpion"),
        ("sagittaire", "Sagittaire"),
        ("sagittarius", "Sagittaire"),
        ("capricorne", "Capricorne"),
        ("capricorn", "Capricorne"),
        ("verseau", "Verseau"),
        ("aquarius", "Verseau"),
        ("poissons", "Poissons"),
        ("poisson", "Poissons"),
        ("pisces", "Poissons"),
    ]
    .into_iter()
    .collect()
});

fn lookup_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn canonical(table: &HashMap<&'static str, &'static str>, raw: &str) -> String {
    let key = lookup_key(raw);
    match table.get(key.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => raw.trim().to_string(),
    }
}

pub(crate) fn is_known_planet(raw: &str) -> bool {
    PLANET_ALIASES.contains_key(lookup_key(raw).as_str())
}

pub(crate) fn is_known_sign(raw: &str) -> bool {
    SIGN_ALIASES.contains_key(lookup_key(raw).as_str())
}

/// Canonical point name; unknown names come back trimmed but otherwise unchanged
pub fn canonical_planet(raw: &str) -> String {
    canonical(&PLANET_ALIASES, raw)
}

/// Canonical sign name; unknown signs come back trimmed but otherwise unchanged
pub fn canonical_sign(raw: &str) -> String {
    canonical(&SIGN_ALIASES, raw)
}
