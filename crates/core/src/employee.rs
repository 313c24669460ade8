//! Employee probation rules.

use chrono::{Days, NaiveDate};

use crate::error::CoreError;

/// Length of the probation period counted from the admission date.
pub const PROBATION_DAYS: u64 = 45;

/// Parse a `YYYY-MM-DD` date supplied for `field`.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        CoreError::Validation(format!("Invalid '{field}' format. Use YYYY-MM-DD"))
    })
}

/// End of probation for an employee admitted on `admission`.
pub fn probation_end(admission: NaiveDate) -> NaiveDate {
    admission
        .checked_add_days(Days::new(PROBATION_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Resolve the stored probation end date.
///
/// Employees not in probation have none. An explicit end date wins,
/// otherwise it is derived from the admission date.
pub fn resolve_probation_end(
    em_experiencia: bool,
    admission: NaiveDate,
    explicit_end: Option<NaiveDate>,
) -> Option<NaiveDate> {
    if !em_experiencia {
        return None;
    }
    Some(explicit_end.unwrap_or_else(|| probation_end(admission)))
}

/// Days left until `end`, clamped at zero. `None` outside probation.
pub fn days_remaining(end: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    end.map(|end| (end - today).num_days().max(0))
}

/// Employee names must be non-blank.
pub fn validate_name(nome: &str) -> Result<String, CoreError> {
    let nome = nome.trim();
    if nome.is_empty() {
        return Err(CoreError::Validation("Field 'nome' is required".into()));
    }
    Ok(nome.to_string())
}
