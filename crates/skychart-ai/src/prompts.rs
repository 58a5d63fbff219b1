//! Prompt templates for the two-stage natal analysis.
//!
//! The chart stage asks for a fixed enumeration of placements, one per line,
//! in a shape the position parser understands. The narrative stage embeds the
//! chart-stage reply verbatim and asks for a report under fixed headings.

use crate::llm_provider::Message;
use skychart_core::BirthData;

/// Celestial points requested by the chart stage, in output order.
/// The lunar nodes form one axis and are requested as the North Node.
pub const CELESTIAL_POINTS: [&str; 21] = [
    "Soleil",
    "Ascendant",
    "Lune",
    "Milieu du Ciel",
    "Mercure",
    "Vénus",
    "Mars",
    "Jupiter",
    "Saturne",
    "Uranus",
    "Neptune",
    "Pluton",
    "Nœud Nord",
    "Chiron",
    "Vertex",
    "Lilith",
    "Pallas",
    "Vesta",
    "Cérès",
    "Part de Fortune",
    "Junon",
];

/// Headings of the narrative report, in order
pub const NARRATIVE_SECTIONS: [&str; 7] = [
    "MISSION DE VIE",
    "CLÉS KARMIQUES",
    "VOCATION PROFESSIONNELLE",
    "EXPRESSION DE L'ÂME",
    "CROISSANCE ET DÉFIS",
    "BLESSURE FONDAMENTALE",
    "STRATÉGIES PRATIQUES",
];

const CHART_SYSTEM_PROMPT: &str = "Tu es un astrologue professionnel. Tu calcules des thèmes natals \
    et tu réponds uniquement dans le format demandé, sans commentaire.";

const NARRATIVE_SYSTEM_PROMPT: &str = "Tu es un astrologue humaniste et bienveillant. Tu rédiges des \
    analyses de mission de vie profondes, concrètes et personnalisées.";

pub struct PromptTemplateEngine;

impl PromptTemplateEngine {
    /// Build the chart-stage prompt listing every celestial point to place
    pub fn render_chart_prompt(birth: &BirthData) -> String {
        let points = CELESTIAL_POINTS
            .iter()
            .map(|point| format!("{} [RETROGRADE] en <Signe> - Maison <N>", point))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "THÈME NATAL\n\n\
            Sujet : {} {}\n\
            Genre : {}\n\
            Date de naissance : {}\n\
            Heure de naissance : {}\n\
            Lieu de naissance : {}\n\n\
            Donne la position de chacun des {} points suivants, une ligne par point, \
            exactement dans ce format :\n\
            <Point> [RETROGRADE] en <Signe> - Maison <N>\n\n\
            N'écris RETROGRADE que si le point est rétrograde. \
            N'ajoute aucune autre ligne.\n\n\
            {}",
            birth.first_names,
            birth.last_name,
            birth.gender,
            birth.birth_date,
            birth.birth_time,
            birth.birthplace(),
            CELESTIAL_POINTS.len(),
            points
        )
    }

    /// Build the narrative-stage prompt around the chart-stage reply
    pub fn render_narrative_prompt(birth: &BirthData, chart_text: &str) -> String {
        let sections = NARRATIVE_SECTIONS
            .iter()
            .enumerate()
            .map(|(i, heading)| format!("{}. {}", i + 1, heading))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "ANALYSE DE MISSION DE VIE\n\n\
            Sujet : {}\n\
            Né(e) le {} à {}, à {}\n\n\
            POSITIONS DU THÈME NATAL :\n{}\n\n\
            À partir de ces positions, rédige une analyse personnalisée adressée à {} \
            avec exactement les sections suivantes, chacune sous son titre :\n{}\n\n\
            Relie chaque affirmation aux placements concernés (planète, signe, maison) \
            et termine par des conseils applicables au quotidien.",
            birth.full_name(),
            birth.birth_date,
            birth.birth_time,
            birth.birthplace(),
            chart_text.trim(),
            birth.first_names,
            sections
        )
    }

    pub fn chart_messages(birth: &BirthData) -> Vec<Message> {
        vec![
            Message::system(CHART_SYSTEM_PROMPT),
            Message::user(Self::render_chart_prompt(birth)),
        ]
    }

    pub fn narrative_messages(birth: &BirthData, chart_text: &str) -> Vec<Message> {
        vec![
            Message::system(NARRATIVE_SYSTEM_PROMPT),
            Message::user(Self::render_narrative_prompt(birth, chart_text)),
        ]
    }

    /// Title of the life-mission section for a subject
    pub fn mission_title(birth: &BirthData) -> String {
        format!("Mission de vie de {}", birth.full_name())
    }
}
