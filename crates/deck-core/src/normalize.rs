//! Card name normalization
//!
//! Turns display names into the keys the catalog is indexed by. Two names
//! that a player would consider the same card should produce the same key:
//! case, surrounding whitespace, accents, punctuation and a trailing
//! ", The" article never matter.

use deunicode::deunicode;

/// Compute the canonical lookup key for a raw name
///
/// Examples:
/// - "The Path of Blood" -> "the path of blood"
/// - "Path of Blood, The" -> "the path of blood"
/// - "  AK-47 " -> "ak47"
/// - "Anarch Convert" and "anarch  convert" -> "anarch convert"
pub fn canonical_key(name: &str) -> String {
    let lower = deunicode(name).to_lowercase();
    let shifted = shift_article(lower.trim());

    let mut key = String::with_capacity(shifted.len());
    for word in shifted.split_whitespace() {
        let cleaned: String = word.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if cleaned.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push(' ');
        }
        key.push_str(&cleaned);
    }
    key
}

/// Move a trailing ", the" to the front of the name
fn shift_article(name: &str) -> String {
    match name.strip_suffix(", the") {
        Some(stem) => format!("the {}", stem.trim_end()),
        None => name.to_string(),
    }
}

/// Looser key used for best-guess matching
///
/// Drops the article "the", spaces and all vowels so that common spelling
/// variants ("Rotschreck"/"Rötschreck", "Anastasz di Zagreb"/"Anastaszdi
/// Zagreb") collapse together.
pub fn fuzzy_key(name: &str) -> String {
    canonical_key(name)
        .split(' ')
        .filter(|w| *w != "the")
        .flat_map(|w| w.chars())
        .filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y'))
        .collect()
}

/// Levenshtein edit distance between two strings, by chars
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Distance used to rank suggestions: 0 when the fuzzy keys agree,
/// otherwise one more than the edit distance between canonical keys
pub fn guess_distance(raw: &str, candidate: &str) -> usize {
    let fuzzy_raw = fuzzy_key(raw);
    if !fuzzy_raw.is_empty() && fuzzy_raw == fuzzy_key(candidate) {
        return 0;
    }
    edit_distance(&canonical_key(raw), &canonical_key(candidate)) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace() {
        assert_eq!(canonical_key("The Path of Blood"), "the path of blood");
        assert_eq!(canonical_key("THE PATH OF bLOOD"), "the path of blood");
        assert_eq!(canonical_key("  the paTH oF bLOOD \t"), "the path of blood");
        assert_eq!(canonical_key("Anarch   Convert"), "anarch convert");
    }

    #[test]
    fn test_article_shift() {
        assert_eq!(
            canonical_key("Path of Blood, The"),
            canonical_key("The Path of Blood")
        );
        assert_eq!(canonical_key("Path of Blood , The "), "the path of blood");
    }

    #[test]
    fn test_punctuation_and_accents() {
        assert_eq!(canonical_key(".44 Magnum"), "44 magnum");
        assert_eq!(canonical_key("AK-47"), "ak47");
        assert_eq!(canonical_key("Rötschreck"), canonical_key("Rotschreck"));
        assert_eq!(
            canonical_key("Aaron Duggan, Cameron's Toady"),
            "aaron duggan camerons toady"
        );
        assert_eq!(canonical_key("Alan Sovereign (Advanced)"), "alan sovereign advanced");
    }

    #[test]
    fn test_idempotent() {
        for name in [
            "The Path of Blood",
            "Path of Blood, The",
            ".44 Magnum",
            "Inez \"Nurse216\" Villagrande",
            "Rötschreck",
            " - ",
            "",
            "Pier 13, Port of Baltimore",
        ] {
            let once = canonical_key(name);
            assert_eq!(canonical_key(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn test_fuzzy_key() {
        assert_eq!(fuzzy_key("Anastasz di Zagreb"), fuzzy_key("Anastaszdi Zagreb"));
        assert_eq!(fuzzy_key("The Path of Blood"), fuzzy_key("Path of Blood"));
        assert_ne!(fuzzy_key("Abbot"), fuzzy_key("Abebe Jr"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("abbot", "abbott"), 1);
    }

    #[test]
    fn test_guess_distance() {
        assert_eq!(guess_distance("Path of Blood", "The Path of Blood"), 0);
        assert_eq!(guess_distance("Abbat", "Abbot"), 0);
        assert_eq!(guess_distance("Magnum 44", "Magnum 45"), 2);
    }
}
