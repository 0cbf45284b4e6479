//! Wildcard name filters.
//!
//! Patterns support `*` (any run of characters, including none) and `?`
//! (exactly one character) and are anchored at both ends.

use serde::{Deserialize, Serialize};

/// Matches `candidate` against a single wildcard `pattern`.
pub fn wildcard_match(candidate: &str, pattern: &str, case_sensitive: bool) -> bool {
    let text: Vec<char> = candidate.chars().collect();
    let pat: Vec<char> = pattern.chars().collect();
    let same = |a: char, b: char| {
        if case_sensitive {
            a == b
        } else {
            a.to_lowercase().eq(b.to_lowercase())
        }
    };

    let (mut ti, mut pi) = (0usize, 0usize);
    // Position after the last `*` seen and the text index it is anchored to.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < text.len() {
        if pi < pat.len() && pat[pi] == '*' {
            pi += 1;
            backtrack = Some((pi, ti));
        } else if pi < pat.len() && (pat[pi] == '?' || same(pat[pi], text[ti])) {
            pi += 1;
            ti += 1;
        } else if let Some((star_pi, star_ti)) = backtrack {
            pi = star_pi;
            ti = star_ti + 1;
            backtrack = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    while pi < pat.len() && pat[pi] == '*' {
        pi += 1;
    }
    pi == pat.len()
}

/// True when any pattern matches; an empty pattern list yields `match_empty`.
pub fn matches_any<S: AsRef<str>>(
    candidate: &str,
    patterns: &[S],
    match_empty: bool,
    case_sensitive: bool,
) -> bool {
    if patterns.is_empty() {
        return match_empty;
    }
    patterns
        .iter()
        .any(|p| wildcard_match(candidate, p.as_ref(), case_sensitive))
}

// ============================================================================
// FILTER SETS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    SourceFile,
    SourceFileExclude,
    TestSuite,
    TestSuiteExclude,
    TestCase,
    TestCaseExclude,
    Subcase,
    SubcaseExclude,
    Reporters,
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::SourceFile,
        FilterKind::SourceFileExclude,
        FilterKind::TestSuite,
        FilterKind::TestSuiteExclude,
        FilterKind::TestCase,
        FilterKind::TestCaseExclude,
        FilterKind::Subcase,
        FilterKind::SubcaseExclude,
        FilterKind::Reporters,
    ];

    /// Result for an empty list: inclusion filters admit everything,
    /// exclusion filters reject nothing.
    pub fn match_empty(self) -> bool {
        !matches!(
            self,
            FilterKind::SourceFileExclude
                | FilterKind::TestSuiteExclude
                | FilterKind::TestCaseExclude
                | FilterKind::SubcaseExclude
                | FilterKind::Reporters
        )
    }

    pub fn option_name(self) -> &'static str {
        match self {
            FilterKind::SourceFile => "source-file",
            FilterKind::SourceFileExclude => "source-file-exclude",
            FilterKind::TestSuite => "test-suite",
            FilterKind::TestSuiteExclude => "test-suite-exclude",
            FilterKind::TestCase => "test-case",
            FilterKind::TestCaseExclude => "test-case-exclude",
            FilterKind::Subcase => "subcase",
            FilterKind::SubcaseExclude => "subcase-exclude",
            FilterKind::Reporters => "reporters",
        }
    }
}

/// The nine pattern lists that select tests, subcases, and reporters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Filters {
    pub source_file: Vec<String>,
    pub source_file_exclude: Vec<String>,
    pub test_suite: Vec<String>,
    pub test_suite_exclude: Vec<String>,
    pub test_case: Vec<String>,
    pub test_case_exclude: Vec<String>,
    pub subcase: Vec<String>,
    pub subcase_exclude: Vec<String>,
    pub reporters: Vec<String>,
}

impl Filters {
    pub fn get(&self, kind: FilterKind) -> &[String] {
        match kind {
            FilterKind::SourceFile => &self.source_file,
            FilterKind::SourceFileExclude => &self.source_file_exclude,
            FilterKind::TestSuite => &self.test_suite,
            FilterKind::TestSuiteExclude => &self.test_suite_exclude,
            FilterKind::TestCase => &self.test_case,
            FilterKind::TestCaseExclude => &self.test_case_exclude,
            FilterKind::Subcase => &self.subcase,
            FilterKind::SubcaseExclude => &self.subcase_exclude,
            FilterKind::Reporters => &self.reporters,
        }
    }

    pub fn get_mut(&mut self, kind: FilterKind) -> &mut Vec<String> {
        match kind {
            FilterKind::SourceFile => &mut self.source_file,
            FilterKind::SourceFileExclude => &mut self.source_file_exclude,
            FilterKind::TestSuite => &mut self.test_suite,
            FilterKind::TestSuiteExclude => &mut self.test_suite_exclude,
            FilterKind::TestCase => &mut self.test_case,
            FilterKind::TestCaseExclude => &mut self.test_case_exclude,
            FilterKind::Subcase => &mut self.subcase,
            FilterKind::SubcaseExclude => &mut self.subcase_exclude,
            FilterKind::Reporters => &mut self.reporters,
        }
    }

    /// Adds a pattern, builder style.
    pub fn with(mut self, kind: FilterKind, pattern: impl Into<String>) -> Self {
        self.get_mut(kind).push(pattern.into());
        self
    }

    /// Appends patterns to one list without dropping what is already there.
    pub fn extend<I, S>(&mut self, kind: FilterKind, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.get_mut(kind).extend(patterns.into_iter().map(Into::into));
    }

    pub fn matches(&self, kind: FilterKind, candidate: &str, case_sensitive: bool) -> bool {
        matches_any(candidate, self.get(kind), kind.match_empty(), case_sensitive)
    }

    /// Include/exclude pair check: admitted by `include`, not hit by `exclude`.
    pub fn admits(
        &self,
        include: FilterKind,
        exclude: FilterKind,
        candidate: &str,
        case_sensitive: bool,
    ) -> bool {
        self.matches(include, candidate, case_sensitive)
            && !self.matches(exclude, candidate, case_sensitive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_run() {
        assert!(wildcard_match("vector push", "vector*", true));
        assert!(wildcard_match("vector", "vector*", true));
        assert!(wildcard_match("a long name", "*long*", true));
        assert!(wildcard_match("", "*", true));
        assert!(!wildcard_match("vectors", "vector", true));
    }

    #[test]
    fn question_mark_matches_exactly_one() {
        assert!(wildcard_match("cat", "c?t", true));
        assert!(!wildcard_match("ct", "c?t", true));
        assert!(!wildcard_match("cart", "c?t", true));
    }

    #[test]
    fn backtracks_after_partial_match() {
        assert!(wildcard_match("abcbcd", "a*bcd", true));
        assert!(wildcard_match("mississippi", "*sip*", true));
        assert!(!wildcard_match("mississippi", "*sipx*", true));
    }

    #[test]
    fn case_folding_is_optional() {
        assert!(!wildcard_match("Math", "math", true));
        assert!(wildcard_match("Math", "math", false));
        assert!(wildcard_match("MATH suite", "m*S?ITE", false));
    }

    #[test]
    fn empty_lists_use_match_empty() {
        let none: [&str; 0] = [];
        assert!(matches_any("x", &none, true, true));
        assert!(!matches_any("x", &none, false, true));
        assert!(matches_any("alpha", &["beta", "al*"], false, true));
    }

    #[test]
    fn include_and_exclude_pairs() {
        let filters = Filters::default()
            .with(FilterKind::TestCase, "net*")
            .with(FilterKind::TestCaseExclude, "*slow*");
        let admits = |name: &str| {
            filters.admits(FilterKind::TestCase, FilterKind::TestCaseExclude, name, true)
        };
        assert!(admits("net connect"));
        assert!(!admits("net slow connect"));
        assert!(!admits("disk"));
        assert!(filters.admits(
            FilterKind::TestSuite,
            FilterKind::TestSuiteExclude,
            "anything",
            true
        ));
    }
}
