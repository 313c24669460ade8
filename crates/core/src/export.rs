//! Spreadsheet export layout: header schema and row building.
//!
//! Column A always holds the feedback id, which is how an already exported
//! row is found again on re-sync.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::feedback::FeedbackType;
use crate::types::{DbId, Timestamp};

/// Worksheet (tab) that receives exported records.
pub const WORKSHEET_TITLE: &str = "Feedbacks";

/// Default title for a freshly created spreadsheet.
pub const DEFAULT_SPREADSHEET_TITLE: &str = "Sistema de Feedback - Funcionários";

pub const BASE_HEADERS: [&str; 6] = [
    "ID",
    "Data/Hora",
    "Tipo Feedback",
    "Setor",
    "Funcionário",
    "Autor",
];

pub const DESCRIPTION_HEADER: &str = "Descrição";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Sorted, de-duplicated union of every department's attribute names.
pub fn attribute_union<'a, I>(department_attributes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    department_attributes
        .into_iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Full header row for the given attribute union.
pub fn header_row(attributes: &[String]) -> Vec<String> {
    BASE_HEADERS
        .iter()
        .map(|h| h.to_string())
        .chain(attributes.iter().cloned())
        .chain(std::iter::once(DESCRIPTION_HEADER.to_string()))
        .collect()
}

/// Whether the sheet's current first row already equals `expected`.
///
/// Trailing empty cells returned by the remote store are ignored.
pub fn header_matches(current: &[String], expected: &[String]) -> bool {
    let trimmed_len = current
        .iter()
        .rposition(|c| !c.is_empty())
        .map_or(0, |i| i + 1);
    current[..trimmed_len] == *expected
}

/// Everything needed to render one exported row.
#[derive(Debug, Clone)]
pub struct ExportRecord {
    pub id: DbId,
    pub tipo: FeedbackType,
    pub data_feedback: Timestamp,
    pub setor_nome: Option<String>,
    pub funcionario_nome: Option<String>,
    pub autor_username: Option<String>,
    pub avaliacoes: Option<Map<String, Value>>,
    pub descricao: Option<String>,
    pub detalhes: Option<String>,
}

/// Render `record` against the column layout of `attributes`.
///
/// Attribute cells are only filled for `diario` records. Every other type
/// leaves them blank and fills the trailing free-text column instead.
pub fn build_row(record: &ExportRecord, attributes: &[String]) -> Vec<Value> {
    let text = |s: &Option<String>| Value::String(s.clone().unwrap_or_default());
    let blank = || Value::String(String::new());

    let mut row = vec![
        Value::from(record.id),
        Value::String(format_timestamp(&record.data_feedback)),
        Value::String(title_case(record.tipo.as_str())),
        text(&record.setor_nome),
        text(&record.funcionario_nome),
        text(&record.autor_username),
    ];

    let ratings = match (&record.tipo, &record.avaliacoes) {
        (FeedbackType::Diario, Some(ratings)) => Some(ratings),
        _ => None,
    };
    row.extend(attributes.iter().map(|attr| {
        ratings
            .and_then(|r| r.get(attr))
            .cloned()
            .unwrap_or_else(blank)
    }));

    let free_text = match record.tipo {
        FeedbackType::Diario => None,
        _ => record.descricao.clone().or_else(|| record.detalhes.clone()),
    };
    row.push(Value::String(free_text.unwrap_or_default()));
    row
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Capitalise the first letter of every word, lowercase the rest. Any
/// non-alphabetic character starts a new word (`diario_experiencia`
/// becomes `Diario_Experiencia`).
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Spreadsheet column letter for a 1-based column index (1 -> A, 27 -> AA).
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A1 range covering `width` columns of the 1-based `row`.
pub fn row_range(row: usize, width: usize) -> String {
    format!(
        "A{row}:{}{row}",
        column_letter(width.max(1)),
    )
}

/// Browser URL of a spreadsheet.
pub fn spreadsheet_url(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn record(tipo: FeedbackType) -> ExportRecord {
        ExportRecord {
            id: 42,
            tipo,
            data_feedback: chrono::Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap(),
            setor_nome: Some("Padaria".into()),
            funcionario_nome: Some("Maria".into()),
            autor_username: Some("usuario".into()),
            avaliacoes: json!({"Limpeza": 4, "Atendimento": 5}).as_object().cloned(),
            descricao: Some("Atendeu bem".into()),
            detalhes: None,
        }
    }

    #[test]
    fn attribute_union_is_sorted_and_unique() {
        let padaria = names(&["Limpeza", "Atendimento"]);
        let loja = names(&["Vendas", "Limpeza"]);
        assert_eq!(
            attribute_union([padaria.as_slice(), loja.as_slice()]),
            names(&["Atendimento", "Limpeza", "Vendas"])
        );
    }

    #[test]
    fn header_row_wraps_attributes_with_base_and_description() {
        let headers = header_row(&names(&["Limpeza"]));
        assert_eq!(headers.first().map(String::as_str), Some("ID"));
        assert_eq!(headers[6], "Limpeza");
        assert_eq!(headers.last().map(String::as_str), Some("Descrição"));
        assert_eq!(headers.len(), 8);
    }

    #[test]
    fn header_match_ignores_trailing_blank_cells() {
        let expected = header_row(&[]);
        let mut current = expected.clone();
        current.push(String::new());
        assert!(header_matches(&current, &expected));
        assert!(!header_matches(&current[..3], &expected));
        assert!(!header_matches(&[], &expected));
    }

    #[test]
    fn daily_rows_fill_attribute_columns_and_leave_text_blank() {
        let attrs = names(&["Atendimento", "Limpeza", "Vendas"]);
        let row = build_row(&record(FeedbackType::Diario), &attrs);
        assert_eq!(
            row,
            vec![
                json!(42),
                json!("05/03/2024 14:07:09"),
                json!("Diario"),
                json!("Padaria"),
                json!("Maria"),
                json!("usuario"),
                json!(5),
                json!(4),
                json!(""),
                json!(""),
            ]
        );
    }

    #[test]
    fn other_types_leave_attributes_blank_and_fill_text() {
        let attrs = names(&["Atendimento", "Limpeza"]);
        let row = build_row(&record(FeedbackType::Positiva), &attrs);
        assert_eq!(row[6], json!(""));
        assert_eq!(row[7], json!(""));
        assert_eq!(row[8], json!("Atendeu bem"));
    }

    #[test]
    fn final_review_text_falls_back_to_details() {
        let mut rec = record(FeedbackType::FinalExperiencia);
        rec.descricao = None;
        rec.detalhes = Some("Recomendado".into());
        let row = build_row(&rec, &[]);
        assert_eq!(row[2], json!("Final_Experiencia"));
        assert_eq!(row.last(), Some(&json!("Recomendado")));
    }

    #[test]
    fn column_letters_roll_over_past_z() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(8), "H");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(row_range(3, 28), "A3:AB3");
    }
}
