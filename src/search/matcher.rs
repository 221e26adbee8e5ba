use std::sync::Arc;

use memchr::memmem;

use crate::search::error::{Result, SearchError};

/// Finds the first hit inside a byte range. Offsets are relative to the
/// slice passed in; the end is exclusive.
pub trait PatternMatcher: Send {
    fn first_match(&mut self, bytes: &[u8]) -> Option<(usize, usize)>;
}

/// Builds one fresh matcher per search buffer.
pub trait MatcherFactory: Send + Sync {
    fn make_matcher(&self) -> Box<dyn PatternMatcher>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Literal,
    /// Edit-distance search; `score` is the minimum percent identity.
    Approximate { score: u8 },
}

impl Algorithm {
    pub fn factory(self, pattern: &str) -> Result<Arc<dyn MatcherFactory>> {
        let pattern = pattern.trim().to_ascii_uppercase().into_bytes();
        if pattern.is_empty() {
            return Err(SearchError::Initialization(
                "search pattern is empty".to_string(),
            ));
        }
        match self {
            Algorithm::Literal => Ok(Arc::new(LiteralFactory {
                pattern: Arc::from(pattern),
            })),
            Algorithm::Approximate { score } => {
                if !(1..=100).contains(&score) {
                    return Err(SearchError::Initialization(format!(
                        "score must be within 1..=100, got {score}"
                    )));
                }
                let max_errors = max_errors_for_score(pattern.len(), score);
                Ok(Arc::new(ApproximateFactory {
                    pattern: Arc::from(pattern),
                    max_errors,
                }))
            }
        }
    }
}

pub(crate) fn max_errors_for_score(pattern_len: usize, score: u8) -> usize {
    let required = (pattern_len * score as usize).div_ceil(100);
    pattern_len - required
}

struct LiteralFactory {
    pattern: Arc<[u8]>,
}

impl MatcherFactory for LiteralFactory {
    fn make_matcher(&self) -> Box<dyn PatternMatcher> {
        Box::new(LiteralMatcher::new(&self.pattern))
    }
}

pub struct LiteralMatcher {
    finder: memmem::Finder<'static>,
}

impl LiteralMatcher {
    pub fn new(pattern: &[u8]) -> Self {
        Self {
            finder: memmem::Finder::new(pattern).into_owned(),
        }
    }
}

impl PatternMatcher for LiteralMatcher {
    fn first_match(&mut self, bytes: &[u8]) -> Option<(usize, usize)> {
        let start = self.finder.find(bytes)?;
        Some((start, start + self.finder.needle().len()))
    }
}

struct ApproximateFactory {
    pattern: Arc<[u8]>,
    max_errors: usize,
}

impl MatcherFactory for ApproximateFactory {
    fn make_matcher(&self) -> Box<dyn PatternMatcher> {
        Box::new(ApproximateMatcher::new(self.pattern.clone(), self.max_errors))
    }
}

/// Semi-global edit-distance scan (Sellers). Reports the hit that ends
/// first; among alignments ending there, the one starting latest.
pub struct ApproximateMatcher {
    pattern: Arc<[u8]>,
    max_errors: usize,
    costs: Vec<usize>,
    starts: Vec<usize>,
}

impl ApproximateMatcher {
    pub fn new(pattern: Arc<[u8]>, max_errors: usize) -> Self {
        let rows = pattern.len() + 1;
        Self {
            pattern,
            max_errors,
            costs: vec![0; rows],
            starts: vec![0; rows],
        }
    }
}

impl PatternMatcher for ApproximateMatcher {
    fn first_match(&mut self, bytes: &[u8]) -> Option<(usize, usize)> {
        let m = self.pattern.len();
        // column before any text: aligning i pattern bytes to nothing costs i
        for i in 0..=m {
            self.costs[i] = i;
            self.starts[i] = 0;
        }
        for (j, &byte) in bytes.iter().enumerate() {
            // row 0 is free: an alignment may begin at any text position
            let mut diag_cost = self.costs[0];
            let mut diag_start = self.starts[0];
            self.costs[0] = 0;
            self.starts[0] = j + 1;
            for i in 1..=m {
                let up_cost = self.costs[i];
                let up_start = self.starts[i];
                let substitution = diag_cost + usize::from(self.pattern[i - 1] != byte);
                let deletion = up_cost + 1;
                let insertion = self.costs[i - 1] + 1;

                let (mut cost, mut start) = (substitution, diag_start);
                if deletion < cost || (deletion == cost && up_start > start) {
                    cost = deletion;
                    start = up_start;
                }
                if insertion < cost || (insertion == cost && self.starts[i - 1] > start) {
                    cost = insertion;
                    start = self.starts[i - 1];
                }

                diag_cost = up_cost;
                diag_start = up_start;
                self.costs[i] = cost;
                self.starts[i] = start;
            }
            if self.costs[m] <= self.max_errors {
                return Some((self.starts[m], j + 1));
            }
        }
        None
    }
}
