//! Feedback record rules: type vocabulary, per-type payload validation,
//! row-level ownership and list/stats filter parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::guard::Identity;
use crate::types::{DbId, Timestamp};

/// Inclusive bounds for a single attribute rating.
pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

/// Sub-key of the evaluation payload averaged by the daily evolution report.
pub const EVOLUTION_SCORE_KEY: &str = "nota";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Diario,
    Positiva,
    Negativa,
    Experiencia,
    DiarioExperiencia,
    FinalExperiencia,
}

impl FeedbackType {
    /// Every type accepted on creation.
    pub const ALL: [FeedbackType; 6] = [
        FeedbackType::Diario,
        FeedbackType::Positiva,
        FeedbackType::Negativa,
        FeedbackType::Experiencia,
        FeedbackType::DiarioExperiencia,
        FeedbackType::FinalExperiencia,
    ];

    /// The narrower set accepted when editing an existing record.
    pub const UPDATABLE: [FeedbackType; 3] = [
        FeedbackType::Diario,
        FeedbackType::Positiva,
        FeedbackType::Negativa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackType::Diario => "diario",
            FeedbackType::Positiva => "positiva",
            FeedbackType::Negativa => "negativa",
            FeedbackType::Experiencia => "experiencia",
            FeedbackType::DiarioExperiencia => "diario_experiencia",
            FeedbackType::FinalExperiencia => "final_experiencia",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl std::fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-dependent body of a feedback submission or edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackPayload {
    pub avaliacoes: Option<Map<String, Value>>,
    pub descricao: Option<String>,
    pub detalhes: Option<String>,
    pub recomenda_efetivacao: Option<bool>,
}

fn joined(types: &[FeedbackType]) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse the `tipo` of a new record. Missing or unknown values are rejected.
pub fn parse_create_type(raw: Option<&str>) -> Result<FeedbackType, CoreError> {
    let raw = raw.ok_or_else(|| CoreError::Validation("Field 'tipo' is required".into()))?;
    FeedbackType::parse(raw).ok_or_else(|| {
        CoreError::Validation(format!(
            "Field 'tipo' must be one of: {}",
            joined(&FeedbackType::ALL)
        ))
    })
}

/// Parse the `tipo` of an edit. Only [`FeedbackType::UPDATABLE`] is allowed.
pub fn parse_update_type(raw: &str) -> Result<FeedbackType, CoreError> {
    FeedbackType::parse(raw)
        .filter(|t| FeedbackType::UPDATABLE.contains(t))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Field 'tipo' must be one of: {}",
                joined(&FeedbackType::UPDATABLE)
            ))
        })
}

/// Every rating must be a JSON number within `[MIN_RATING, MAX_RATING]`.
pub fn validate_ratings(avaliacoes: &Map<String, Value>) -> Result<(), CoreError> {
    for (attribute, rating) in avaliacoes {
        let in_range = rating
            .as_f64()
            .is_some_and(|r| (MIN_RATING..=MAX_RATING).contains(&r));
        if !in_range {
            return Err(CoreError::Validation(format!(
                "Rating for '{attribute}' must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
    }
    Ok(())
}

/// Daily ratings may only name attributes of the employee's department.
pub fn validate_attribute_names(
    avaliacoes: &Map<String, Value>,
    department_attributes: &[String],
) -> Result<(), CoreError> {
    match avaliacoes
        .keys()
        .find(|k| !department_attributes.iter().any(|a| a == *k))
    {
        Some(unknown) => Err(CoreError::Validation(format!(
            "Attribute '{unknown}' is not evaluated in this department"
        ))),
        None => Ok(()),
    }
}

fn required_ratings<'a>(
    payload: &'a FeedbackPayload,
) -> Result<&'a Map<String, Value>, CoreError> {
    payload
        .avaliacoes
        .as_ref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| CoreError::Validation("Field 'avaliacoes' is required".into()))
}

fn is_blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}

/// Validate the payload of a new record of type `kind`.
///
/// `department_attributes` is the attribute vocabulary of the target
/// employee's department.
pub fn validate_new_payload(
    kind: FeedbackType,
    payload: &FeedbackPayload,
    department_attributes: &[String],
) -> Result<(), CoreError> {
    match kind {
        FeedbackType::Diario => {
            let ratings = required_ratings(payload)?;
            validate_ratings(ratings)?;
            validate_attribute_names(ratings, department_attributes)
        }
        FeedbackType::DiarioExperiencia => validate_ratings(required_ratings(payload)?),
        FeedbackType::Positiva | FeedbackType::Negativa => {
            if is_blank(payload.descricao.as_deref()) {
                return Err(CoreError::Validation(
                    "Field 'descricao' is required".into(),
                ));
            }
            Ok(())
        }
        FeedbackType::FinalExperiencia => {
            if is_blank(payload.detalhes.as_deref()) {
                return Err(CoreError::Validation("Field 'detalhes' is required".into()));
            }
            if payload.recomenda_efetivacao.is_none() {
                return Err(CoreError::Validation(
                    "Field 'recomenda_efetivacao' is required".into(),
                ));
            }
            Ok(())
        }
        FeedbackType::Experiencia => Ok(()),
    }
}

/// Validate supplied ratings on an edit. Ratings are only checked when the
/// record's resulting type is `diario`.
pub fn validate_updated_ratings(
    resulting_type: FeedbackType,
    avaliacoes: Option<&Map<String, Value>>,
    department_attributes: &[String],
) -> Result<(), CoreError> {
    match avaliacoes {
        Some(ratings) if resulting_type == FeedbackType::Diario => {
            validate_ratings(ratings)?;
            validate_attribute_names(ratings, department_attributes)
        }
        _ => Ok(()),
    }
}

/// Normalize an edited description. A record whose resulting type is
/// `positiva` or `negativa` must keep non-blank text, whether supplied now
/// or already stored as `current`. `None` leaves the stored text alone.
pub fn validate_updated_description(
    resulting_type: FeedbackType,
    supplied: Option<&str>,
    current: Option<&str>,
) -> Result<Option<String>, CoreError> {
    let text = normalize_text(supplied);
    let needs_text = matches!(resulting_type, FeedbackType::Positiva | FeedbackType::Negativa);
    let left_blank = match supplied {
        Some(_) => text.is_none(),
        None => is_blank(current),
    };
    if needs_text && left_blank {
        return Err(CoreError::Validation("Field 'descricao' is required".into()));
    }
    Ok(text)
}

/// Trim free text; blank text is stored as `NULL`.
pub fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Row-level ownership: admins may act on anything, everyone else only on
/// records they authored.
pub fn ensure_can_access(identity: &Identity, author_id: DbId) -> Result<(), CoreError> {
    if identity.is_admin() || identity.user_id == author_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Access denied".into()))
    }
}

/// Author restriction applied to list and stats queries.
///
/// Non-admins are always pinned to themselves, whatever they asked for.
pub fn effective_author_filter(identity: &Identity, requested: Option<DbId>) -> Option<DbId> {
    if identity.is_admin() {
        requested
    } else {
        Some(identity.user_id)
    }
}

/// Parse an optional `tipo` list filter.
pub fn parse_type_filter(raw: Option<&str>) -> Result<Option<FeedbackType>, CoreError> {
    raw.map(|r| {
        FeedbackType::parse(r).ok_or_else(|| {
            CoreError::Validation(format!(
                "Field 'tipo' must be one of: {}",
                joined(&FeedbackType::ALL)
            ))
        })
    })
    .transpose()
}

/// Parse an inclusive range bound (`data_inicio` / `data_fim`).
///
/// Accepts RFC 3339 (`2024-01-01T10:00:00Z`), a naive ISO date-time
/// (interpreted as UTC) or a bare date (midnight UTC).
pub fn parse_range_bound(field: &str, raw: Option<&str>) -> Result<Option<Timestamp>, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(naive.and_utc()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_hms_opt(0, 0, 0).map(|n| n.and_utc()));
    }
    Err(CoreError::Validation(format!(
        "Invalid '{field}' format. Use ISO 8601"
    )))
}

/// Label for one day in the daily evolution report.
pub fn format_evolution_day(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}
