/// Minimum per-token similarity for a name to qualify.
pub const MATCH_THRESHOLD: f64 = 75.0;

/// Normalised InDel similarity in `[0, 100]`: `100 * 2 * lcs / (len_a + len_b)`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] of the shorter string against every equally long window of the longer one,
/// including the windows that only partially overlap its start and end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();
    let mut best = 0.0f64;

    let windows = (1..m)
        .map(|end| &long[..end])
        .chain((0..=n - m).map(|start| &long[start..start + m]))
        .chain((n - m + 1..n).map(|start| &long[start..]));
    for window in windows {
        best = best.max(ratio_chars(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    rapidfuzz::fuzz::ratio(a.iter().copied(), b.iter().copied()) * 100.0
}

/// Lowercased whitespace-separated query tokens.
pub fn query_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_lowercase).collect()
}

/// Scores names against a fixed token set.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    tokens: Vec<String>,
}

impl NameMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            tokens: query_tokens(query),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Mean of per-token `max(ratio, partial_ratio)`, or 0 if any token falls below
    /// [`MATCH_THRESHOLD`].
    pub fn score(&self, name: &str) -> f64 {
        match_score(name, &self.tokens)
    }
}

pub fn match_score(name: &str, tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let name = name.to_lowercase();
    let mut sum = 0.0;
    for token in tokens {
        let best = ratio(token, &name).max(partial_ratio(token, &name));
        if best < MATCH_THRESHOLD {
            return 0.0;
        }
        sum += best;
    }
    sum / tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(query: &str) -> Vec<String> {
        query_tokens(query)
    }

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        // lcs("kitten", "sitting") = 4 → 2*4/13
        assert!((ratio("kitten", "sitting") - 800.0 / 13.0).abs() < 1e-9);
        // lcs = 5 over 5 + 16 chars
        assert!((ratio("reprt", "report_march.pdf") - 1000.0 / 21.0).abs() < 1e-9);
        assert!((ratio("abc", "abcdef") - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(ratio("zzz", "abcdef"), 0.0);
    }

    #[test]
    fn test_partial_ratio_finds_substring() {
        assert_eq!(partial_ratio("abc", "xxabcxx"), 100.0);
        assert_eq!(partial_ratio("xxabcxx", "abc"), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
        assert!(partial_ratio("reprt", "report_march.pdf") >= 80.0);
    }

    #[test]
    fn test_match_score_prefix_is_high() {
        assert!(match_score("abcdef", &tokens("abc")) >= MATCH_THRESHOLD);
        assert_eq!(match_score("abcdef", &tokens("zzz")), 0.0);
    }

    #[test]
    fn test_every_token_must_qualify() {
        let name = "Report_March.pdf";
        assert!(match_score(name, &tokens("report march")) > 90.0);
        assert_eq!(match_score(name, &tokens("report zebra")), 0.0);
        assert_eq!(match_score(name, &[]), 0.0);
    }

    #[test]
    fn test_fuzzy_typo_tolerance() {
        let matcher = NameMatcher::new("  REPRT ");
        assert_eq!(matcher.tokens(), ["reprt".to_string()]);
        assert!(matcher.score("report_march.pdf") >= MATCH_THRESHOLD);
        assert_eq!(matcher.score("invoice.xlsx"), 0.0);
    }

    #[test]
    fn test_unicode_names() {
        assert_eq!(match_score("Отчёт_март.pdf", &tokens("отчёт")), 100.0);
    }
}
