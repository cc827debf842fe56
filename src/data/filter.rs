use super::model::{BirthRecord, RecordStore};

// ---------------------------------------------------------------------------
// Name input parsing
// ---------------------------------------------------------------------------

/// Normalise a single name the way names are stored: trimmed, uppercased.
pub fn normalize_name(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Split a comma-separated list of names into normalised tokens.
///
/// Order is kept and duplicates are not removed: callers pair the list with
/// a colour palette by position.
pub fn parse_name_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parse the input of a single-name view. `None` when nothing is left after trimming.
pub fn parse_single_name(input: &str) -> Option<String> {
    let name = normalize_name(input);
    (!name.is_empty()).then_some(name)
}

// ---------------------------------------------------------------------------
// Record selection
// ---------------------------------------------------------------------------

/// Records whose name is one of `names`. Empty when nothing matches.
pub fn filter_by_names<'a>(store: &'a RecordStore, names: &[String]) -> Vec<&'a BirthRecord> {
    store
        .records()
        .iter()
        .filter(|rec| names.iter().any(|n| *n == rec.name))
        .collect()
}

/// Records for exactly one name. The name is normalised before comparing.
pub fn filter_by_exact_name<'a>(store: &'a RecordStore, name: &str) -> Vec<&'a BirthRecord> {
    let name = normalize_name(name);
    store
        .records()
        .iter()
        .filter(|rec| rec.name == name)
        .collect()
}
