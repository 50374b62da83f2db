//! Text normalization and similarity scoring for event titles and market
//! questions.

use std::collections::HashSet;

/// Words carrying no matching signal in market titles.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "at", "to", "by", "for", "will", "be", "is",
    "are", "was", "it", "this", "that", "what", "when", "how", "with", "vs", "v",
];

/// Fixed synonym map applied during tokenization. Each entry folds a venue's
/// phrasing onto a shared canonical token.
const SYNONYMS: &[(&str, &str)] = &[
    ("cpi", "inflation"),
    ("fed", "federal"),
    ("reserve", "federal"),
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("potus", "president"),
    ("scotus", "court"),
];

/// Lowercase, strip diacritics, drop non-alphanumerics, collapse whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.chars() {
        let c = fold_diacritic(c);
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Map common Latin diacritics onto their ASCII base letter.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        _ => c,
    }
}

/// Normalized tokens with stopwords removed and synonyms folded.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .map(|w| {
            SYNONYMS
                .iter()
                .find(|(from, _)| *from == w)
                .map_or_else(|| w.to_string(), |(_, to)| (*to).to_string())
        })
        .collect()
}

/// Tokens of length >= 4, excluding stopwords.
#[must_use]
pub fn significant_tokens(text: &str) -> Vec<String> {
    tokenize(text).into_iter().filter(|t| t.len() >= 4).collect()
}

/// All contiguous n-grams of `tokens`, joined by a single space.
#[must_use]
pub fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

/// `1 - edit_distance / max(len)`, on characters. Two empty strings score 0.
#[must_use]
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 0.0;
    }
    let dist = levenshtein(&a, &b);
    1.0 - dist as f64 / max_len as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `|A ∩ B| / |A ∪ B|`; 0 when the union is empty.
#[must_use]
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// All 4-digit substrings in [1900, 2100].
#[must_use]
pub fn extract_years(text: &str) -> Vec<u16> {
    let bytes = text.as_bytes();
    let mut years = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                if let Ok(year) = text[start..i].parse::<u16>() {
                    if (1900..=2100).contains(&year) {
                        years.push(year);
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn normalize_lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize("Will Bitcoin hit $100,000?!"),
            "will bitcoin hit 100 000"
        );
    }

    #[test]
    fn normalize_folds_diacritics() {
        assert_eq!(normalize("Raphaël Glücksmann"), "raphael glucksmann");
    }

    #[test]
    fn tokenize_drops_stopwords_and_applies_synonyms() {
        let tokens = tokenize("Will the CPI rise in December");
        assert_eq!(tokens, vec!["inflation", "rise", "december"]);
    }

    #[test]
    fn significant_tokens_require_four_chars() {
        let tokens = significant_tokens("Who won NBA cup 2025");
        assert_eq!(tokens, vec!["2025"]);
    }

    #[test]
    fn ngrams_join_with_space() {
        let tokens: Vec<String> = ["bitcoin", "price", "december"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        assert_eq!(
            ngrams(&tokens, 2),
            vec!["bitcoin price", "price december"]
        );
        assert!(ngrams(&tokens, 4).is_empty());
        assert!(ngrams(&tokens, 0).is_empty());
    }

    #[test]
    fn levenshtein_similarity_scores() {
        assert_eq!(levenshtein_similarity("", ""), 0.0);
        assert_eq!(levenshtein_similarity("abc", "abc"), 1.0);
        let sim = levenshtein_similarity("kitten", "sitting");
        assert!((sim - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn jaccard_similarity_scores() {
        assert_eq!(jaccard_similarity(&set(&[]), &set(&[])), 0.0);
        assert_eq!(jaccard_similarity(&set(&["a", "b"]), &set(&["a", "b"])), 1.0);
        let sim = jaccard_similarity(&set(&["a", "b", "c"]), &set(&["b", "c", "d"]));
        assert!((sim - 0.5).abs() < 1e-9);
    }

    #[test]
    fn extract_years_bounds() {
        assert_eq!(extract_years("election-2024-and-2025"), vec![2024, 2025]);
        assert!(extract_years("room 1899 in 2101").is_empty());
        // 5-digit runs are not years
        assert!(extract_years("id 20255").is_empty());
    }
}
