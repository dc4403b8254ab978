//! Identifier cleanup and static lookups

/// Normalize a CNPJ to its canonical 14-digit form.
///
/// Strips punctuation/whitespace and left-pads with zeros; values with no
/// digits at all map to `None`.
pub fn normalize_cnpj14(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(format!("{digits:0>14}"))
}

/// Description for a CNAE activity code, when known.
//
// TODO: load the full official CNAE table instead of this seed subset.
pub fn cnae_description(code: &str) -> Option<&'static str> {
    match code {
        "6201-5/01" => Some("Desenvolvimento de programas de computador sob encomenda"),
        _ => None,
    }
}
