//! Fuzzy database-name resolution.
//!
//! When a command names a database that does not exist, the resolver turns the
//! miss into a [`StashError::DatabaseNotFound`] carrying "did you mean" hints.
//!
//! All comparisons run on the bare form of a name: a leading `@` is stripped
//! from the requested name and from every candidate before measuring, and
//! suggestions are rendered with the `@` put back.

use crate::core::address;
use crate::core::error::StashError;
use crate::core::registry::Registry;
use std::fmt;
use std::path::PathBuf;

/// Default edit-distance ceiling for [`SuggestStrategy::ThresholdPrefix`].
pub const DEFAULT_THRESHOLD: usize = 2;

/// How candidate names are accepted as suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestStrategy {
    /// Accept `d` when `levenshtein(req, d) <= |len(req) - len(d)|`.
    ///
    /// The distance is never smaller than the length difference, so this holds
    /// exactly when the shorter name is a subsequence of the longer one. Names of
    /// very different length are admitted freely; that looseness is accepted.
    LengthBound,
    /// Accept `d` when the distance is at most `max_distance`, or when either
    /// name is a prefix of the other.
    ThresholdPrefix { max_distance: usize },
}

impl Default for SuggestStrategy {
    fn default() -> Self {
        SuggestStrategy::LengthBound
    }
}

/// `@`-prefixed database names offered as hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions(Vec<String>);

impl Suggestions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for Suggestions {
    fn from(names: Vec<String>) -> Self {
        Suggestions(names)
    }
}

impl fmt::Display for Suggestions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "no suggestions found")
        } else {
            write!(f, "did you mean \"{}\"", self.0.join(", "))
        }
    }
}

/// Levenshtein distance over chars, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn bare(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

fn accepts(strategy: SuggestStrategy, requested: &str, candidate: &str) -> bool {
    let distance = levenshtein(requested, candidate);
    match strategy {
        SuggestStrategy::LengthBound => {
            let diff = requested
                .chars()
                .count()
                .abs_diff(candidate.chars().count());
            distance <= diff
        }
        SuggestStrategy::ThresholdPrefix { max_distance } => {
            distance <= max_distance
                || candidate.starts_with(requested)
                || requested.starts_with(candidate)
        }
    }
}

/// Suggestions for `requested` among `known`, in the order of `known`.
///
/// An empty request means no database was named; every known name is offered.
pub fn suggest(requested: &str, known: &[String], strategy: SuggestStrategy) -> Suggestions {
    let requested = bare(requested);
    let picked = known
        .iter()
        .map(|k| bare(k))
        .filter(|k| requested.is_empty() || accepts(strategy, requested, k))
        .map(|k| format!("@{}", k))
        .collect();
    Suggestions(picked)
}

/// `Ok(())` when `requested` names a known database, otherwise `DatabaseNotFound`.
pub fn resolve(
    requested: &str,
    known: &[String],
    strategy: SuggestStrategy,
) -> Result<(), StashError> {
    let name = bare(requested);
    if !name.is_empty() && known.iter().any(|k| bare(k) == name) {
        return Ok(());
    }
    Err(StashError::DatabaseNotFound {
        name: name.to_string(),
        suggestions: suggest(name, known, strategy),
    })
}

/// Directory of an existing database `name`, or `DatabaseNotFound` with hints.
///
/// An empty name never resolves: callers reach this only when a database had to
/// be named explicitly.
pub fn find_db(
    registry: &Registry,
    name: &str,
    strategy: SuggestStrategy,
) -> Result<PathBuf, StashError> {
    let name = bare(name);
    address::validate_db_name(name)?;
    let known = registry.list()?;
    if !name.is_empty() && known.iter().any(|k| k == name) {
        return registry.namespace_path(name);
    }
    tracing::debug!(requested = name, known = known.len(), "database not found");
    Err(StashError::DatabaseNotFound {
        name: name.to_string(),
        suggestions: suggest(name, &known, strategy),
    })
}
