use crate::normalization::{canonical_planet, canonical_sign, is_known_planet, is_known_sign};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use skychart_core::PlanetPosition;
use tracing::debug;

const DEFAULT_HOUSE: u8 = 1;

/// `<name> [(qualifier)] [RETROGRADE] en|in <sign> [NN°[MM'[SS"]]] [- Maison <N>] [commentary]`
static PRINCIPAL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*(?:[-*•+]|\d{1,2}[.)])?\s*(?:\*\*)?(?P<name>\p{L}[\p{L}'’-]*(?:\s+\p{L}[\p{L}'’-]*){0,3}?)(?:\*\*)?(?:\s*\((?P<qualifier>[^)]*)\))?\s*:?\s+(?:r[ée]trograde\s+)?(?:in|en|dans)\s+(?:\*\*)?(?P<sign>\p{L}+)(?:\*\*)?(?:\s*,?\s*(?P<deg>\d{1,2})\s*°(?:\s*(?P<min>\d{1,2})\s*['′](?:\s*(?P<sec>\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')?)?)?)?(?:\s*\(?r[ée]trograde\)?)?(?:\s*[-–—,:]?\s*(?:\*\*)?(?:house|maison)\s*:?\s*(?P<house>\d{1,2})\b(?:\*\*)?)?"#,
    )
    .expect("principal line pattern is valid")
});

/// `<name> <deg>°<min>'<sec>" <sign>`
static DEGREE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*(?:[-*•+]|\d{1,2}[.)])?\s*(?:\*\*)?(?P<name>\p{L}[\p{L}'’-]*(?:\s+\p{L}[\p{L}'’-]*){0,3}?)(?:\*\*)?\s*:?\s+(?P<deg>\d{1,3})\s*°\s*(?P<min>\d{1,2})\s*['′]\s*(?P<sec>\d{1,2}(?:\.\d+)?)\s*(?:"|″|'')?\s*(?:\*\*)?(?P<sign>\p{L}+)(?:\*\*)?\s*[.;]?\s*$"#,
    )
    .expect("degree line pattern is valid")
});

/// Outcome of matching one line of chart text
#[derive(Debug, Clone, PartialEq)]
pub enum LineMatch {
    Matched(PlanetPosition),
    Unmatched,
}

impl LineMatch {
    pub fn is_matched(&self) -> bool {
        matches!(self, LineMatch::Matched(_))
    }
}

/// Extracts placements from free-form chart text. Lines that fit neither
/// grammar are skipped; parsing never fails.
pub struct PositionParser;

impl PositionParser {
    /// All recognized placements, in source order, duplicates kept
    pub fn parse(chart_text: &str) -> Vec<PlanetPosition> {
        let mut positions = Vec::new();
        let mut skipped = 0usize;

        for line in chart_text.lines().filter(|l| !l.trim().is_empty()) {
            match Self::parse_line(line) {
                LineMatch::Matched(position) => positions.push(position),
                LineMatch::Unmatched => skipped += 1,
            }
        }

        debug!(
            matched = positions.len(),
            skipped, "Parsed chart text into positions"
        );
        positions
    }

    pub fn parse_line(line: &str) -> LineMatch {
        if let Some(caps) = PRINCIPAL_LINE.captures(line) {
            // Commentary may follow a placement, so a known point or sign is
            // what separates placements from prose
            if is_known_planet(&caps["name"]) || is_known_sign(&caps["sign"]) {
                return LineMatch::Matched(Self::principal_position(line, &caps));
            }
        }
        if let Some(caps) = DEGREE_LINE.captures(line) {
            return Self::degree_position(&caps);
        }
        LineMatch::Unmatched
    }

    fn principal_position(line: &str, caps: &Captures<'_>) -> PlanetPosition {
        let house = caps
            .name("house")
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .filter(|h| (1..=12).contains(h))
            .unwrap_or(DEFAULT_HOUSE);

        let degree = caps.name("deg").and_then(|deg| {
            let deg = deg.as_str().parse::<u32>().ok()?;
            let min = match caps.name("min") {
                Some(m) => m.as_str().parse::<u32>().ok()?,
                None => 0,
            };
            let sec = match caps.name("sec") {
                Some(s) => s.as_str().parse::<f64>().ok()?,
                None => 0.0,
            };
            to_decimal_degree(deg, min, sec)
        });

        PlanetPosition {
            planet: canonical_planet(&caps["name"]),
            sign: canonical_sign(&caps["sign"]),
            house,
            retrograde: is_retrograde(line),
            degree,
        }
    }

    fn degree_position(caps: &Captures<'_>) -> LineMatch {
        let deg = caps["deg"].parse::<u32>().ok();
        let min = caps["min"].parse::<u32>().ok();
        let sec = caps["sec"].parse::<f64>().ok();

        let degree = match (deg, min, sec) {
            (Some(deg), Some(min), Some(sec)) => to_decimal_degree(deg, min, sec),
            _ => None,
        };

        match degree {
            Some(degree) => LineMatch::Matched(PlanetPosition {
                planet: canonical_planet(&caps["name"]),
                sign: canonical_sign(&caps["sign"]),
                house: DEFAULT_HOUSE,
                retrograde: false,
                degree: Some(degree),
            }),
            None => LineMatch::Unmatched,
        }
    }
}

fn is_retrograde(line: &str) -> bool {
    let lowered = line.to_lowercase();
    lowered.contains("retrograde") || lowered.contains("rétrograde")
}

/// Decimal degree within a sign, or `None` when a component is out of range
fn to_decimal_degree(deg: u32, min: u32, sec: f64) -> Option<f64> {
    if deg >= 30 || min >= 60 || !(0.0..60.0).contains(&sec) {
        return None;
    }
    Some(deg as f64 + min as f64 / 60.0 + sec / 3600.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matched(line: &str) -> PlanetPosition {
        match PositionParser::parse_line(line) {
            LineMatch::Matched(position) => position,
            LineMatch::Unmatched => panic!("expected a match for {:?}", line),
        }
    }

    #[test]
    fn test_retrograde_principal_line() {
        let position = matched("Jupiter RETROGRADE en Sagittaire - Maison 9");
        assert_eq!(position.planet, "Jupiter");
        assert_eq!(position.sign, "Sagittaire");
        assert_eq!(position.house, 9);
        assert!(position.retrograde);
        assert_eq!(position.degree, None);
    }

    #[test]
    fn test_english_line_is_canonicalized() {
        let position = matched("Sun in Pisces - House 10");
        assert_eq!(position.planet, "Soleil");
        assert_eq!(position.sign, "Poissons");
        assert_eq!(position.house, 10);
        assert!(!position.retrograde);
    }

    #[test]
    fn test_multi_word_names_and_qualifier() {
        let position = matched("Milieu du Ciel en Capricorne - Maison 10");
        assert_eq!(position.planet, "Milieu du Ciel");

        let position = matched("Noeud Nord (vrai) en Gemeaux - Maison 3");
        assert_eq!(position.planet, "Nœud Nord");
        assert_eq!(position.sign, "Gémeaux");
        assert_eq!(position.house, 3);
    }

    #[test]
    fn test_missing_or_invalid_house_defaults_to_one() {
        assert_eq!(matched("Lune en Lion").house, 1);
        assert_eq!(matched("Lune en Lion - Maison 14").house, 1);
    }

    #[test]
    fn test_retrograde_anywhere_on_line() {
        let position = matched("Saturne en Capricorne (Rétrograde) - Maison 4");
        assert!(position.retrograde);
        assert_eq!(position.house, 4);

        let position = matched("Mercure en Verseau retrograde - Maison 8");
        assert!(position.retrograde);
    }

    #[test]
    fn test_markdown_decorations() {
        let position = matched("- **Vénus** en **Taureau** - Maison 2");
        assert_eq!(position.planet, "Vénus");
        assert_eq!(position.sign, "Taureau");
        assert_eq!(position.house, 2);

        let position = matched("3. Mars en Bélier - Maison 1");
        assert_eq!(position.planet, "Mars");
    }

    #[test]
    fn test_optional_degree_on_principal_line() {
        let position = matched("Soleil en Poissons 24°30' - Maison 9");
        assert_relative_eq!(position.degree.unwrap(), 24.5);
        assert_eq!(position.house, 9);
    }

    #[test]
    fn test_degree_line() {
        let position = matched("Soleil 24°52'30\" Poissons");
        assert_eq!(position.planet, "Soleil");
        assert_eq!(position.sign, "Poissons");
        assert_eq!(position.house, 1);
        assert!(!position.retrograde);
        assert_relative_eq!(
            position.degree.unwrap(),
            24.0 + 52.0 / 60.0 + 30.0 / 3600.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_degree_line_out_of_range_is_unmatched() {
        assert_eq!(
            PositionParser::parse_line("Soleil 45°10'00\" Poissons"),
            LineMatch::Unmatched
        );
        assert_eq!(
            PositionParser::parse_line("Soleil 12°75'00\" Poissons"),
            LineMatch::Unmatched
        );
    }

    #[test]
    fn test_prose_is_unmatched() {
        for line in [
            "Voici les positions du thème natal demandé :",
            "Vous êtes né en France et votre thème est riche.",
            "Vous êtes née en France.",
            "Votre enfance en province a compté.",
            "---",
            "Ces placements indiquent une forte sensibilité.",
        ] {
            assert!(
                !PositionParser::parse_line(line).is_matched(),
                "unexpected match for {:?}",
                line
            );
        }
    }

    #[test]
    fn test_parse_skips_blank_lines_and_keeps_order() {
        let text = "\nSoleil en Poissons - Maison 9\n\n   \nLune en Lion - Maison 2\nSoleil en Poissons - Maison 9\n";
        let positions = PositionParser::parse(text);
        let names: Vec<_> = positions.iter().map(|p| p.planet.as_str()).collect();
        assert_eq!(names, vec!["Soleil", "Lune", "Soleil"]);
    }

    #[test]
    fn test_unknown_values_pass_through() {
        let position = matched("Éris en Bélier - Maison 5");
        assert_eq!(position.planet, "Éris");
        assert_eq!(position.sign, "Bélier");

        let position = matched("Soleil en Ophiuchus");
        assert_eq!(position.planet, "Soleil");
        assert_eq!(position.sign, "Ophiuchus");
    }

    #[test]
    fn test_commentary_after_placement() {
        let position =
            matched("Jupiter RETROGRADE en Sagittaire - Maison 9 - expansion spirituelle");
        assert_eq!(position.planet, "Jupiter");
        assert_eq!(position.sign, "Sagittaire");
        assert_eq!(position.house, 9);
        assert!(position.retrograde);

        let position = matched("Soleil en Poissons - Maison 9 : intuition et compassion");
        assert_eq!(position.sign, "Poissons");
        assert_eq!(position.house, 9);
        assert!(!position.retrograde);

        let position = matched("Lune en Lion, une émotivité chaleureuse");
        assert_eq!(position.sign, "Lion");
        assert_eq!(position.house, 1);
    }

    #[test]
    fn test_seconds_on_principal_line() {
        let position = matched("Soleil en Poissons 24°52'30\" - Maison 9");
        assert_eq!(position.house, 9);
        assert_relative_eq!(
            position.degree.unwrap(),
            24.0 + 52.0 / 60.0 + 30.0 / 3600.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_house_number_must_be_whole() {
        assert_eq!(matched("Mars en Bélier - Maison 123").house, 1);
    }
}
