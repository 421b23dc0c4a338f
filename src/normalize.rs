/// Connectives kept in lowercase inside a location name.
const CONNECTIVES: [&str; 2] = ["and", "of"];

/// Canonical join key for a location as published upstream.
///
/// `"UNITED_kingdom"` becomes `"United Kingdom"` and
/// `"bosnia AND herzegovina"` becomes `"Bosnia and Herzegovina"`.
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .split(|c| c == ' ' || c == '_')
        .filter(|token| !token.is_empty())
        .map(normalize_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_token(token: &str) -> String {
    let lower = token.to_lowercase();
    if CONNECTIVES.contains(&lower.as_str()) {
        return lower;
    }
    let mut chars = lower.chars();
    let Some(first) = chars.next() else {
        return lower;
    };
    // `ß` uppercases to `SS`; such letters stay lowercase
    let mut upper = first.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => std::iter::once(single).chain(chars).collect(),
        _ => lower,
    }
}
