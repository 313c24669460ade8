//! Department attribute vocabulary.

use crate::error::CoreError;

/// Department names must be non-blank. Returns the trimmed name.
pub fn validate_name(nome: &str) -> Result<String, CoreError> {
    let nome = nome.trim();
    if nome.is_empty() {
        return Err(CoreError::Validation("Field 'nome' is required".into()));
    }
    Ok(nome.to_string())
}

/// Trim names, drop blanks and duplicates, keep first-seen order.
pub fn normalize_attributes<I, S>(attributes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for attr in attributes {
        let attr = attr.as_ref().trim();
        if !attr.is_empty() && !out.iter().any(|a| a == attr) {
            out.push(attr.to_string());
        }
    }
    out
}

/// Add an attribute. Returns `false` when it was already present.
pub fn add_attribute(attributes: &mut Vec<String>, name: &str) -> Result<bool, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Field 'atributo' is required".into()));
    }
    if attributes.iter().any(|a| a == name) {
        return Ok(false);
    }
    attributes.push(name.to_string());
    Ok(true)
}

/// Remove an attribute. Returns `false` when it was absent.
pub fn remove_attribute(attributes: &mut Vec<String>, name: &str) -> bool {
    let name = name.trim();
    let before = attributes.len();
    attributes.retain(|a| a != name);
    attributes.len() != before
}
