use crate::error::{CoreError, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%Hh%M"];

/// Birth data of the consulting subject, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthData {
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenoms")]
    pub first_names: String,
    #[serde(rename = "genre")]
    pub gender: String,
    #[serde(rename = "dateNaissance")]
    pub birth_date: String,
    #[serde(rename = "heureNaissance")]
    pub birth_time: String,
    #[serde(rename = "paysNaissance")]
    pub birth_country: String,
    #[serde(rename = "villeNaissance")]
    pub birth_city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Which fields of the birth data identify a cache subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintScope {
    /// Date, time and city of birth only
    #[default]
    BirthMoment,
    /// Birth moment plus last name and first names
    Subject,
}

impl BirthData {
    /// Cache key: lower-cased concatenation of date, time and city of birth.
    ///
    /// With [`FingerprintScope::Subject`] the names are appended so that two
    /// people born at the same moment and place get distinct entries.
    pub fn fingerprint(&self, scope: FingerprintScope) -> String {
        let mut key = format!("{}{}{}", self.birth_date, self.birth_time, self.birth_city);
        if scope == FingerprintScope::Subject {
            key.push('|');
            key.push_str(&self.last_name);
            key.push('|');
            key.push_str(&self.first_names);
        }
        key.to_lowercase()
    }

    /// "Ville, Pays" display form of the birthplace
    pub fn birthplace(&self) -> String {
        format!("{}, {}", self.birth_city, self.birth_country)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_name)
    }
}

/// Validates and canonicalizes caller-supplied birth data
pub struct BirthDataNormalizer;

impl BirthDataNormalizer {
    pub fn normalize(input: &BirthData) -> Result<BirthData> {
        let last_name = required("nom", &input.last_name)?;
        let first_names = required("prenoms", &input.first_names)?;
        let birth_city = required("villeNaissance", &input.birth_city)?;
        let birth_country = required("paysNaissance", &input.birth_country)?;
        let birth_date = Self::canonical_date(&required("dateNaissance", &input.birth_date)?)?;
        let birth_time = Self::canonical_time(&required("heureNaissance", &input.birth_time)?)?;
        let gender = Self::canonical_gender(&input.gender);
        let email = match input.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(email) => Some(Self::checked_email(email)?),
        };

        Ok(BirthData {
            last_name,
            first_names,
            gender,
            birth_date,
            birth_time,
            birth_country,
            birth_city,
            email,
        })
    }

    /// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and `DD-MM-YYYY`; returns `YYYY-MM-DD`
    pub fn canonical_date(raw: &str) -> Result<String> {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .map(|date| date.format("%Y-%m-%d").to_string())
            .ok_or_else(|| CoreError::InvalidBirthData(format!("unrecognized date: {}", raw)))
    }

    /// Accepts `HH:MM`, `HH:MM:SS`, `HHhMM` and `HHh`; returns `HH:MM`
    pub fn canonical_time(raw: &str) -> Result<String> {
        let mut candidate = raw.to_lowercase();
        if candidate.ends_with('h') {
            candidate.push_str("00");
        }

        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(&candidate, fmt).ok())
            .map(|time| time.format("%H:%M").to_string())
            .ok_or_else(|| CoreError::InvalidBirthData(format!("unrecognized time: {}", raw)))
    }

    pub fn canonical_gender(raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "f" | "femme" | "feminin" | "féminin" | "female" => "female".to_string(),
            "m" | "homme" | "masculin" | "male" => "male".to_string(),
            _ => lowered,
        }
    }

    fn checked_email(email: &str) -> Result<String> {
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
                Ok(email.to_string())
            }
            _ => Err(CoreError::InvalidBirthData(format!(
                "invalid email address: {}",
                email
            ))),
        }
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidBirthData(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
