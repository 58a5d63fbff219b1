use crate::birth_data::BirthData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placement of one celestial point in the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetPosition {
    /// Canonical point name (e.g. "Soleil", "Nœud Nord")
    #[serde(rename = "planete")]
    pub planet: String,
    /// Canonical zodiac sign (e.g. "Sagittaire")
    #[serde(rename = "signe")]
    pub sign: String,
    /// House number, 1 to 12
    #[serde(rename = "maison")]
    pub house: u8,
    pub retrograde: bool,
    /// Degree within the sign, in [0, 30)
    #[serde(rename = "degre", default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<f64>,
}

/// Display fields of the chart subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSubject {
    pub nom: String,
    pub prenoms: String,
    pub genre: String,
    pub date_naissance: String,
    pub heure_naissance: String,
    pub lieu_naissance: String,
}

impl From<&BirthData> for ChartSubject {
    fn from(data: &BirthData) -> Self {
        Self {
            nom: data.last_name.clone(),
            prenoms: data.first_names.clone(),
            genre: data.gender.clone(),
            date_naissance: data.birth_date.clone(),
            heure_naissance: data.birth_time.clone(),
            lieu_naissance: data.birthplace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalChart {
    #[serde(rename = "sujet")]
    pub subject: ChartSubject,
    pub positions: Vec<PlanetPosition>,
    /// Raw chart-stage text, kept for audit
    #[serde(rename = "aspectsTexte")]
    pub raw_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeMission {
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(rename = "contenu")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// Wall-clock pipeline duration in milliseconds
    pub processing_time: u64,
    pub tokens_used: usize,
    pub model: String,
    pub cached: bool,
}

/// Full output of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "carteDuCiel")]
    pub chart: NatalChart,
    #[serde(rename = "missionDeVie")]
    pub mission: LifeMission,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// Copy served from cache: new session id and timestamp, flagged as cached
    pub fn refreshed_from_cache(&self) -> Self {
        let mut copy = self.clone();
        copy.session_id = Uuid::new_v4();
        copy.timestamp = Utc::now();
        copy.metadata.cached = true;
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisResult {
        AnalysisResult {
            session_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            chart: NatalChart {
                subject: ChartSubject {
                    nom: "Dupont".to_string(),
                    prenoms: "Sophie".to_string(),
                    genre: "female".to_string(),
                    date_naissance: "1990-03-15".to_string(),
                    heure_naissance: "14:30".to_string(),
                    lieu_naissance: "Paris, France".to_string(),
                },
                positions: vec![PlanetPosition {
                    planet: "Jupiter".to_string(),
                    sign: "Sagittaire".to_string(),
                    house: 9,
                    retrograde: true,
                    degree: None,
                }],
                raw_text: "Jupiter RETROGRADE en Sagittaire - Maison 9".to_string(),
            },
            mission: LifeMission {
                title: "Mission de vie".to_string(),
                content: "...".to_string(),
            },
            metadata: AnalysisMetadata {
                processing_time: 1200,
                tokens_used: 3100,
                model: "gpt-4o-mini".to_string(),
                cached: false,
            },
        }
    }

    #[test]
    fn test_refreshed_copy_keeps_content() {
        let original = sample();
        let copy = original.refreshed_from_cache();

        assert_ne!(copy.session_id, original.session_id);
        assert!(copy.metadata.cached);
        assert_eq!(copy.chart, original.chart);
        assert_eq!(copy.mission, original.mission);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json["sessionId"].is_string());
        assert_eq!(json["carteDuCiel"]["sujet"]["lieuNaissance"], "Paris, France");
        assert_eq!(json["carteDuCiel"]["positions"][0]["planete"], "Jupiter");
        assert_eq!(json["carteDuCiel"]["positions"][0]["maison"], 9);
        assert!(json["carteDuCiel"]["positions"][0].get("degre").is_none());
        assert_eq!(json["missionDeVie"]["titre"], "Mission de vie");
        assert_eq!(json["metadata"]["tokensUsed"], 3100);
        assert_eq!(json["metadata"]["processingTime"], 1200);
    }
}
