/// Known dealer locations and their division codes.
const DEALER_DIVISIONS: [(&str, &str); 10] = [
    ("AMRAVATI", "AMT"),
    ("CHAUFULA_SZZ", "CHA"),
    ("CHIKHALI", "CHI"),
    ("KOLHAPUR_WS", "KOL"),
    ("NAGPUR_KAMPTHEE ROAD", "HO"),
    ("NAGPUR_WARDHAMAN NGR", "CITY"),
    ("SHIKRAPUR_SZS", "SHI"),
    ("WAGHOLI", "WAG"),
    ("YAVATMAL", "YAT"),
    ("NAGPUR_WARDHAMAN NGR_CQ", "CQ"),
];

/// Maps a dealer location to its division code. Unlisted locations become
/// their own division, unchanged.
pub fn dealer_division(location: &str) -> String {
    DEALER_DIVISIONS
        .iter()
        .find(|(known, _)| *known == location)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| location.to_string())
}

/// First three characters of the trimmed fiscal month text.
pub fn month_key(fiscal_month: &str) -> String {
    fiscal_month.trim().chars().take(3).collect()
}

/// True for division values that must not appear as a summary row.
pub fn is_blank_division(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == "nan"
}

/// Trimmed division, or `None` when blank.
pub fn clean_division(value: &str) -> Option<String> {
    if is_blank_division(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

pub fn is_arbitration_id(value: &str) -> bool {
    let normalized = value.trim().to_uppercase();
    normalized.starts_with("ARB") && normalized != "NAN"
}
