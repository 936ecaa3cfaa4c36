//! Answer resolution engine.
//!
//! Takes the normalized question and the three normalized answers, drives
//! a search provider for evidence, and produces a confidence-ranked
//! ordering. Each call walks the same sequence: build the query (dropping
//! negation markers), fetch evidence once, expand answer permutations,
//! score, rank, and fall back to a manual browser search when the evidence
//! carries no signal at all.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::ResolveConfig;
use crate::fallback::FallbackBrowser;
use crate::search::{RetrievalError, SearchProvider, Snippet};

/// Scoring strategy over the candidate/evidence data.
///
/// The two modes are alternatives, never combined in one score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Count whole-phrase boundary matches of each permutation
    #[default]
    Exact,
    /// Sum token-set similarity ratios (0-100) per snippet
    Fuzzy,
}

/// An answer plus the permutations searched for it.
#[derive(Debug, Clone)]
pub struct AnswerCandidate {
    pub text: String,
    pub permutations: Vec<String>,
}

impl AnswerCandidate {
    /// Builds the candidate for one normalized answer.
    ///
    /// Multi-word answers also get their word-order-reversed form: OCR and
    /// natural phrasing sometimes invert word pairs, and searching both
    /// forms raises recall without hurting a three-answer set.
    pub fn new(text: &str) -> Self {
        let mut permutations = vec![text.to_string()];
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() > 1 {
            let mut reversed = words;
            reversed.reverse();
            permutations.push(reversed.join(" "));
        }
        Self { text: text.to_string(), permutations }
    }

    /// Boundary-anchored alternation over all permutations.
    fn pattern(&self) -> Regex {
        let alternation = self
            .permutations
            .iter()
            .map(|p| format!(r"\b{}\b", regex::escape(p)))
            .collect::<Vec<_>>()
            .join("|");
        // Escaped literals always compile
        Regex::new(&alternation).expect("Invalid candidate pattern")
    }
}

/// One answer's final score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub answer: String,
    pub score: f64,
}

/// The ranked outcome of one resolution run.
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// Entries sorted by the ranking policy; the first is the best guess
    pub entries: Vec<ScoreEntry>,
    /// Whether a negation marker inverted the ranking direction
    pub inverted: bool,
    /// Whether the all-zero fallback fired
    pub fallback_triggered: bool,
}

impl ResolutionResult {
    pub fn best(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }
}

/// The resolution engine. Holds per-run configuration only; all evidence
/// and candidate state is created fresh inside each `resolve` call.
pub struct Resolver {
    config: ResolveConfig,
}

impl Resolver {
    pub fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    /// Resolves one question against its candidate answers.
    ///
    /// A retrieval failure propagates to the caller; there is no retry and
    /// no partial result. Degenerate evidence (every score zero) is not a
    /// failure: the ranking is returned as-is and the fallback browser is
    /// opened once with the original question.
    pub fn resolve(
        &self,
        question: &str,
        answers: &[String],
        provider: &dyn SearchProvider,
        fallback: &dyn FallbackBrowser,
    ) -> Result<ResolutionResult, RetrievalError> {
        let (query, inverted) = self.rewrite_query(question);
        if inverted {
            crate::log(&format!("Negation detected, searching \"{}\"", query));
        } else {
            crate::log(&format!("Searching \"{}\"", query));
        }

        let snippets = provider.search(&query, self.config.pages)?;
        crate::log(&format!("Got {} snippets from {}", snippets.len(), provider.name()));

        let candidates: Vec<AnswerCandidate> =
            answers.iter().map(|a| AnswerCandidate::new(a)).collect();
        for candidate in &candidates {
            if candidate.permutations.len() > 1 {
                crate::log(&format!(
                    "Answer permutation: \"{}\" -> \"{}\"",
                    candidate.text, candidate.permutations[1]
                ));
            }
        }

        let mut entries = match self.config.mode {
            ScoreMode::Exact => score_exact(&candidates, &snippets),
            ScoreMode::Fuzzy => score_fuzzy(&candidates, &snippets),
        };

        // Stable sort: equal scores keep original answer-list order. For a
        // negated question the least-evidenced answer is the implied
        // correct one, so the direction flips.
        if inverted {
            entries.sort_by(|a, b| a.score.total_cmp(&b.score));
        } else {
            entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        }

        let fallback_triggered = entries.iter().all(|e| e.score == 0.0);
        if fallback_triggered {
            crate::log("All answers scored zero, opening manual search");
            fallback.open_search(question);
        }

        Ok(ResolutionResult { entries, inverted, fallback_triggered })
    }

    /// Scans the question for negation markers and strips them from the
    /// search query. A token matches when it contains any configured
    /// marker as a substring; negation words carry no search signal and
    /// pollute snippet matches, so matching tokens are dropped.
    fn rewrite_query(&self, question: &str) -> (String, bool) {
        let mut inverted = false;
        let kept: Vec<&str> = question
            .split_whitespace()
            .filter(|token| {
                let lower = token.to_lowercase();
                let negated = self
                    .config
                    .negation_markers
                    .iter()
                    .any(|marker| lower.contains(marker.as_str()));
                if negated {
                    inverted = true;
                }
                !negated
            })
            .collect();
        (kept.join(" "), inverted)
    }
}

/// Counts non-overlapping whole-phrase matches of each candidate's
/// permutations across all snippets.
fn score_exact(candidates: &[AnswerCandidate], snippets: &[Snippet]) -> Vec<ScoreEntry> {
    candidates
        .iter()
        .map(|candidate| {
            let pattern = candidate.pattern();
            let count: usize = snippets
                .iter()
                .map(|snippet| pattern.find_iter(&snippet.description.to_lowercase()).count())
                .sum();
            ScoreEntry { answer: candidate.text.clone(), score: count as f64 }
        })
        .collect()
}

/// Sums the token-set similarity ratio of each candidate against each
/// snippet. Permutations are irrelevant here: the token-set comparison is
/// already order-insensitive.
fn score_fuzzy(candidates: &[AnswerCandidate], snippets: &[Snippet]) -> Vec<ScoreEntry> {
    candidates
        .iter()
        .map(|candidate| {
            let total: f64 = snippets
                .iter()
                .map(|snippet| {
                    token_set_ratio(&candidate.text, &snippet.description.to_lowercase())
                })
                .sum();
            ScoreEntry { answer: candidate.text.clone(), score: total }
        })
        .collect()
}

/// Token-set similarity ratio (0-100).
///
/// Compares the sorted intersection of word tokens against each side's
/// intersection-plus-remainder string and takes the best normalized edit
/// similarity of the three pairings. An answer whose tokens all appear in
/// the snippet therefore scores 100 regardless of the surrounding text.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let base = common.join(" ");
    let with_a = join_nonempty(&base, &only_a.join(" "));
    let with_b = join_nonempty(&base, &only_b.join(" "));

    let base_vs_a = strsim::normalized_levenshtein(&base, &with_a);
    let base_vs_b = strsim::normalized_levenshtein(&base, &with_b);
    let a_vs_b = strsim::normalized_levenshtein(&with_a, &with_b);

    100.0 * base_vs_a.max(base_vs_b).max(a_vs_b)
}

fn join_nonempty(left: &str, right: &str) -> String {
    match (left.is_empty(), right.is_empty()) {
        (true, _) => right.to_string(),
        (_, true) => left.to_string(),
        _ => format!("{} {}", left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::RecordingFallback;

    struct FakeProvider {
        snippets: Vec<Snippet>,
    }

    impl FakeProvider {
        fn new(descriptions: &[&str]) -> Self {
            let snippets = descriptions
                .iter()
                .enumerate()
                .map(|(i, d)| Snippet {
                    title: format!("Result {}", i),
                    url: format!("https://example.com/{}", i),
                    description: d.to_string(),
                })
                .collect();
            Self { snippets }
        }
    }

    impl SearchProvider for FakeProvider {
        fn search(&self, _query: &str, _pages: u32) -> Result<Vec<Snippet>, RetrievalError> {
            Ok(self.snippets.clone())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    struct FailingProvider;

    impl SearchProvider for FailingProvider {
        fn search(&self, _query: &str, _pages: u32) -> Result<Vec<Snippet>, RetrievalError> {
            Err(RetrievalError::Http { status: 503, message: "unavailable".to_string() })
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn answers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn resolver() -> Resolver {
        Resolver::new(ResolveConfig::default())
    }

    #[test]
    fn test_single_word_answer_one_permutation() {
        let candidate = AnswerCandidate::new("violins");
        assert_eq!(candidate.permutations, vec!["violins"]);
    }

    #[test]
    fn test_multi_word_answer_two_permutations() {
        let candidate = AnswerCandidate::new("new york city");
        assert_eq!(candidate.permutations, vec!["new york city", "city york new"]);
    }

    #[test]
    fn test_rewrite_query_drops_negation_tokens() {
        let (query, inverted) = resolver().rewrite_query("what is not a string instrument");
        assert!(inverted);
        assert_eq!(query, "what is a string instrument");
    }

    #[test]
    fn test_rewrite_query_matches_marker_inside_token() {
        // Substring semantics: "cannot" carries the marker
        let (query, inverted) = resolver().rewrite_query("which bird cannot fly");
        assert!(inverted);
        assert_eq!(query, "which bird fly");
    }

    #[test]
    fn test_rewrite_query_plain_question_unchanged() {
        let (query, inverted) = resolver().rewrite_query("stradivarius was famous for making what");
        assert!(!inverted);
        assert_eq!(query, "stradivarius was famous for making what");
    }

    #[test]
    fn test_stradivarius_scenario() {
        let provider = FakeProvider::new(&[
            "Stradivarius made violins in Cremona",
            "his violins sell for millions",
            "a luthier's workshop",
        ]);
        let fallback = RecordingFallback::new();

        let result = resolver()
            .resolve(
                "stradivarius was famous for making what",
                &answers(&["spotify", "violins", "hearing aids"]),
                &provider,
                &fallback,
            )
            .unwrap();

        assert!(!result.inverted);
        assert!(!result.fallback_triggered);
        let ranked: Vec<(&str, f64)> =
            result.entries.iter().map(|e| (e.answer.as_str(), e.score)).collect();
        assert_eq!(ranked, vec![("violins", 2.0), ("spotify", 0.0), ("hearing aids", 0.0)]);
        assert!(fallback.opened.borrow().is_empty());
    }

    #[test]
    fn test_negated_scenario_ranks_ascending() {
        let provider = FakeProvider::new(&[
            "the violin is a string instrument",
            "violin and guitar lessons",
            "a violin duet with guitar accompaniment",
        ]);
        let fallback = RecordingFallback::new();

        let result = resolver()
            .resolve(
                "what is not a string instrument",
                &answers(&["violin", "drum", "guitar"]),
                &provider,
                &fallback,
            )
            .unwrap();

        assert!(result.inverted);
        let ranked: Vec<(&str, f64)> =
            result.entries.iter().map(|e| (e.answer.as_str(), e.score)).collect();
        assert_eq!(ranked, vec![("drum", 0.0), ("guitar", 2.0), ("violin", 3.0)]);
    }

    #[test]
    fn test_whole_word_matching_only() {
        // "violins" must not count as "violin"
        let provider = FakeProvider::new(&["many violins here"]);
        let fallback = RecordingFallback::new();

        let result = resolver()
            .resolve("a question", &answers(&["violin", "cello", "harp"]), &provider, &fallback)
            .unwrap();

        assert!(result.entries.iter().all(|e| e.score == 0.0));
    }

    #[test]
    fn test_reversed_permutation_scores() {
        let provider = FakeProvider::new(&["the giants of york new era"]);
        let fallback = RecordingFallback::new();

        let result = resolver()
            .resolve("a question", &answers(&["new york", "boston", "chicago"]), &provider, &fallback)
            .unwrap();

        assert_eq!(result.best().unwrap().answer, "new york");
        assert_eq!(result.best().unwrap().score, 1.0);
    }

    #[test]
    fn test_scoring_monotonicity() {
        let base = ["a violin here", "nothing relevant"];
        let extended = ["a violin here", "nothing relevant", "another violin mention"];
        let fallback = RecordingFallback::new();
        let the_answers = answers(&["violin", "drum", "guitar"]);

        let before = resolver()
            .resolve("a question", &the_answers, &FakeProvider::new(&base), &fallback)
            .unwrap();
        let after = resolver()
            .resolve("a question", &the_answers, &FakeProvider::new(&extended), &fallback)
            .unwrap();

        let score_of = |result: &ResolutionResult, answer: &str| {
            result.entries.iter().find(|e| e.answer == answer).unwrap().score
        };

        assert_eq!(score_of(&after, "violin"), score_of(&before, "violin") + 1.0);
        assert_eq!(score_of(&after, "drum"), score_of(&before, "drum"));
        assert_eq!(score_of(&after, "guitar"), score_of(&before, "guitar"));
    }

    #[test]
    fn test_inversion_reverses_tie_free_ranking() {
        let provider = FakeProvider::new(&[
            "alpha alpha alpha evidence",
            "beta beta evidence",
            "gamma evidence",
        ]);
        let fallback = RecordingFallback::new();
        let the_answers = answers(&["alpha", "beta", "gamma"]);

        let plain = resolver()
            .resolve("which word appears", &the_answers, &provider, &fallback)
            .unwrap();
        let negated = resolver()
            .resolve("which word appears not", &the_answers, &provider, &fallback)
            .unwrap();

        let order = |result: &ResolutionResult| {
            result.entries.iter().map(|e| e.answer.clone()).collect::<Vec<_>>()
        };
        let mut reversed = order(&plain);
        reversed.reverse();
        assert_eq!(order(&negated), reversed);
    }

    #[test]
    fn test_degenerate_evidence_triggers_fallback_once() {
        let provider = FakeProvider::new(&["nothing relevant at all", "still nothing"]);
        let fallback = RecordingFallback::new();

        let result = resolver()
            .resolve(
                "an unanswerable question",
                &answers(&["alpha", "beta", "gamma"]),
                &provider,
                &fallback,
            )
            .unwrap();

        assert!(result.fallback_triggered);
        // All-zero scores keep original input order
        let order: Vec<&str> = result.entries.iter().map(|e| e.answer.as_str()).collect();
        assert_eq!(order, vec!["alpha", "beta", "gamma"]);
        assert!(result.entries.iter().all(|e| e.score == 0.0));
        // Exactly one open, with the original question
        assert_eq!(fallback.opened.borrow().as_slice(), ["an unanswerable question"]);
    }

    #[test]
    fn test_retrieval_error_propagates() {
        let fallback = RecordingFallback::new();
        let result = resolver().resolve(
            "a question",
            &answers(&["alpha", "beta", "gamma"]),
            &FailingProvider,
            &fallback,
        );

        assert!(matches!(result, Err(RetrievalError::Http { status: 503, .. })));
        assert!(fallback.opened.borrow().is_empty());
    }

    #[test]
    fn test_token_set_ratio_identical() {
        assert_eq!(token_set_ratio("new york", "new york"), 100.0);
    }

    #[test]
    fn test_token_set_ratio_subset_scores_full() {
        // All answer tokens appear in the snippet
        let ratio = token_set_ratio("violins", "stradivarius made violins in cremona");
        assert_eq!(ratio, 100.0);
    }

    #[test]
    fn test_token_set_ratio_order_insensitive() {
        assert_eq!(token_set_ratio("york new", "new york"), 100.0);
    }

    #[test]
    fn test_token_set_ratio_disjoint_is_low() {
        let ratio = token_set_ratio("spotify", "stradivarius made violins");
        assert!(ratio < 50.0, "ratio was {}", ratio);
    }

    #[test]
    fn test_token_set_ratio_empty_input() {
        assert_eq!(token_set_ratio("", "anything"), 0.0);
        assert_eq!(token_set_ratio("anything", ""), 0.0);
    }

    #[test]
    fn test_fuzzy_mode_ranks_by_summed_ratio() {
        let provider = FakeProvider::new(&[
            "stradivarius made violins in cremona",
            "violins and cellos on display",
        ]);
        let fallback = RecordingFallback::new();
        let config = ResolveConfig { mode: ScoreMode::Fuzzy, ..ResolveConfig::default() };

        let result = Resolver::new(config)
            .resolve(
                "stradivarius was famous for making what",
                &answers(&["spotify", "violins", "hearing aids"]),
                &provider,
                &fallback,
            )
            .unwrap();

        assert_eq!(result.best().unwrap().answer, "violins");
        assert_eq!(result.best().unwrap().score, 200.0);
        assert!(!result.fallback_triggered);
    }
}
