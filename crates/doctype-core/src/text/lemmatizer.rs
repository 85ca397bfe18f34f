//! Rule-based English noun lemmatizer.
//!
//! Reduces plural nouns to their singular base form using an irregular
//! table and suffix rules. Words it does not recognise as plurals are
//! returned unchanged, so verbs and adjectives pass through.

use std::collections::HashMap;

use lazy_static::lazy_static;

/// Shortest lemma a suffix rule may produce.
const MIN_LEMMA_LEN: usize = 3;

lazy_static! {
    static ref IRREGULAR: HashMap<&'static str, &'static str> = [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("people", "person"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("analyses", "analysis"),
        ("bases", "basis"),
        ("crises", "crisis"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("appendices", "appendix"),
        ("leaves", "leaf"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("selves", "self"),
        ("thieves", "thief"),
    ]
    .into_iter()
    .collect();
}

/// Words ending in `s` that are already singular.
const INVARIANT: &[&str] = &[
    "news", "series", "species", "always", "perhaps", "gas", "canvas", "atlas",
    "alias", "whereas", "christmas", "lens", "means", "goods", "thanks",
    "sales", "headquarters", "premises", "savings", "earnings", "logistics",
    "economics", "statistics", "analytics",
];

/// Lemmatize one lowercase token.
///
/// The result is a fixed point: `lemmatize(&lemmatize(w)) == lemmatize(w)`.
pub fn lemmatize(word: &str) -> String {
    let mut current = word.to_string();
    loop {
        let next = lemmatize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn lemmatize_once(word: &str) -> String {
    if let Some(lemma) = IRREGULAR.get(word) {
        return (*lemma).to_string();
    }

    if INVARIANT.contains(&word) || !word.ends_with('s') {
        return word.to_string();
    }

    let candidate = match word.strip_suffix("ies") {
        Some(stem) if stem.chars().count() >= 2 => format!("{stem}y"),
        _ if ["sses", "xes", "ches", "shes"].iter().any(|s| word.ends_with(s)) => {
            word[..word.len() - 2].to_string()
        }
        _ if ["ss", "us", "is"].iter().any(|s| word.ends_with(s)) => return word.to_string(),
        _ => word[..word.len() - 1].to_string(),
    };

    if candidate.chars().count() < MIN_LEMMA_LEN {
        word.to_string()
    } else {
        candidate
    }
}
