//! Multi-value attribute (MVA) wire encoding.
//!
//! An MVA is stored as comma-separated decimal integers in one text cell.
//! The empty string is an empty list and NULL is NULL.

/// Encodes a list of integers as an MVA cell, preserving order and duplicates.
pub fn encode_mva(values: &[i64]) -> String {
    values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Decodes an MVA cell.
///
/// Returns `None` if any item is not an integer.
pub fn decode_mva(cell: &str) -> Option<Vec<i64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(Vec::new());
    }
    cell.split(',')
        .map(|item| item.trim().parse::<i64>().ok())
        .collect()
}

/// Renders an MVA as the inline tuple used by UPDATE and REPLACE: `(1,2,3)`.
pub fn mva_literal(values: &[i64]) -> String {
    format!("({})", encode_mva(values))
}
