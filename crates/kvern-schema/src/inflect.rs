//! English inflection for schema naming conventions.
//!
//! Collection names are plural (`musicians`, `skills`), model names and
//! foreign-key attributes singular (`musician`, `band_uid`). These helpers
//! cover the regular forms plus the sibilant and `-y` rules; irregular
//! nouns are out of scope for schema identifiers.

/// Pluralize a singular identifier: `musician` → `musicians`,
/// `song_uid` → `song_uids`, `company` → `companies`, `boss` → `bosses`.
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.is_empty() && !ends_with_vowel(stem) {
            return format!("{stem}ies");
        }
    }
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Singularize a plural identifier: `musicians` → `musician`,
/// `companies` → `company`, `bosses` → `boss`.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        if stem.ends_with('s')
            || stem.ends_with('x')
            || stem.ends_with('z')
            || stem.ends_with("ch")
            || stem.ends_with("sh")
        {
            return stem.to_string();
        }
    }
    word.strip_suffix('s').unwrap_or(word).to_string()
}

fn ends_with_vowel(word: &str) -> bool {
    matches!(
        word.chars().last(),
        Some('a') | Some('e') | Some('i') | Some('o') | Some('u')
    )
}
