//! Build-target labels and label sets.
//!
//! A [`Label`] is the canonical form of a target identifier
//! `[@repo]//package[:name]`. Determinators are free to print either the
//! shorthand `//foo` or the explicit `//foo:foo`; both normalize to the
//! same value so reported and expected sets compare equal.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// A normalized target label.
///
/// The only way to build one is [`Label::normalize`] (or its `FromStr` /
/// serde equivalents), so every `Label` value is already canonical.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

/// Package segment that marks a recursive wildcard pattern.
const WILDCARD: &str = "...";

impl Label {
    /// Normalize a raw label.
    ///
    /// - `//foo:bar`, `@repo//foo:bar` are returned unchanged.
    /// - `//foo/bar` becomes `//foo/bar:bar`.
    /// - `//...` and `//foo/...` are wildcard patterns and stay unexpanded.
    ///
    /// # Errors
    /// Returns [`InvalidLabelError`] if `raw` does not match
    /// `(@repo)?//package(:name)?`, or has an empty package and no name.
    pub fn normalize(raw: &str) -> Result<Self, InvalidLabelError> {
        let parts = parse(raw)?;
        if parts.name.is_some() {
            return Ok(Self(raw.to_owned()));
        }

        if parts.package.is_empty() {
            return Err(InvalidLabelError::new(
                raw,
                "empty package names are not supported",
            ));
        }
        let last = parts
            .package
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        if last.is_empty() {
            return Err(InvalidLabelError::new(
                raw,
                "package has no final path segment",
            ));
        }
        if last == WILDCARD {
            return Ok(Self(raw.to_owned()));
        }
        Ok(Self(format!("{raw}:{last}")))
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label is a `...` wildcard pattern rather than a target.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        !self.0.contains(':') && self.0.ends_with(WILDCARD)
    }
}

/// The pieces of a label, borrowed from the raw input.
struct LabelParts<'a> {
    package: &'a str,
    name: Option<&'a str>,
}

fn parse(raw: &str) -> Result<LabelParts<'_>, InvalidLabelError> {
    if raw.contains(['\n', '\r']) {
        return Err(InvalidLabelError::new(raw, "labels cannot span lines"));
    }

    let rest = match raw.strip_prefix('@') {
        // `repo` runs up to the first `/`, which must open the `//`.
        Some(after_at) => match after_at.find('/') {
            Some(slash) => &after_at[slash..],
            None => return Err(InvalidLabelError::new(raw, "missing `//` after repository")),
        },
        None => raw,
    };

    let Some(body) = rest.strip_prefix("//") else {
        return Err(InvalidLabelError::new(
            raw,
            "expected `//package[:name]`, optionally prefixed by `@repo`",
        ));
    };

    Ok(match body.split_once(':') {
        Some((package, name)) => LabelParts {
            package,
            name: Some(name),
        },
        None => LabelParts {
            package: body,
            name: None,
        },
    })
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Label {
    type Err = InvalidLabelError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl TryFrom<String> for Label {
    type Error = InvalidLabelError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::normalize(&s)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

// ---------------------------------------------------------------------------
// InvalidLabelError
// ---------------------------------------------------------------------------

/// A string that is not a label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidLabelError {
    /// The rejected input.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl InvalidLabelError {
    fn new(value: &str, reason: &str) -> Self {
        Self {
            value: value.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

impl fmt::Display for InvalidLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal label {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for InvalidLabelError {}

// ---------------------------------------------------------------------------
// TargetSet
// ---------------------------------------------------------------------------

/// A set of labels with no meaningful order.
///
/// Backed by a `BTreeSet` so that reports and diagnostics list labels in a
/// stable order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet(BTreeSet<Label>);

impl TargetSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Normalize and collect raw label strings.
    ///
    /// # Errors
    /// Fails on the first string that is not a label.
    pub fn parse<'a, I>(raw: I) -> Result<Self, InvalidLabelError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        raw.into_iter().map(Label::normalize).collect()
    }

    /// Parse newline-delimited determinator output, skipping blank lines.
    ///
    /// # Errors
    /// Fails on the first non-blank line that is not a label.
    pub fn from_lines(output: &str) -> Result<Self, InvalidLabelError> {
        output
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(Label::normalize)
            .collect()
    }

    /// Like [`from_lines`](Self::from_lines) but drops lines that are not
    /// labels instead of failing. Used to salvage partial output from a
    /// determinator that exited unsuccessfully.
    #[must_use]
    pub fn from_lines_lossy(output: &str) -> Self {
        output
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .filter_map(|line| Label::normalize(line).ok())
            .collect()
    }

    /// Insert a label; returns whether it was new.
    pub fn insert(&mut self, label: Label) -> bool {
        self.0.insert(label)
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, label: &Label) -> bool {
        self.0.contains(label)
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set has no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in canonical string order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    /// `self − other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// `self ∩ other`.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Whether every label of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl FromIterator<Label> for TargetSet {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TargetSet {
    type Item = Label;
    type IntoIter = std::collections::btree_set::IntoIter<Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a Label;
    type IntoIter = std::collections::btree_set::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(label.as_str())?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        Label::normalize(raw).unwrap().to_string()
    }

    #[test]
    fn normalizes_short_without_repo() {
        assert_eq!(norm("//foo"), "//foo:foo");
    }

    #[test]
    fn keeps_long_without_repo() {
        assert_eq!(norm("//foo:foo"), "//foo:foo");
    }

    #[test]
    fn keeps_different_name_without_repo() {
        assert_eq!(norm("//foo:bar"), "//foo:bar");
    }

    #[test]
    fn leaves_wildcard_unexpanded() {
        assert_eq!(norm("//..."), "//...");
        assert_eq!(norm("//java/..."), "//java/...");
        assert!(Label::normalize("//java/...").unwrap().is_wildcard());
    }

    #[test]
    fn normalizes_short_with_repo() {
        assert_eq!(norm("@repo//foo"), "@repo//foo:foo");
    }

    #[test]
    fn keeps_long_with_repo() {
        assert_eq!(norm("@repo//foo:foo"), "@repo//foo:foo");
        assert_eq!(norm("@repo//foo:bar"), "@repo//foo:bar");
    }

    #[test]
    fn uses_last_package_segment() {
        assert_eq!(norm("//java/example/simple"), "//java/example/simple:simple");
    }

    #[test]
    fn empty_repo_name_is_allowed() {
        assert_eq!(norm("@//foo"), "@//foo:foo");
    }

    #[test]
    fn root_package_with_name_is_valid() {
        assert_eq!(norm("//:all"), "//:all");
    }

    #[test]
    fn rejects_malformed_labels() {
        for raw in ["foo", ":foo", "/foo", "@repo/foo", "@repo", "", "//", "//foo\n"] {
            assert!(Label::normalize(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn short_and_long_forms_are_equal() {
        assert_eq!(
            Label::normalize("//foo").unwrap(),
            Label::normalize("//foo:foo").unwrap()
        );
    }

    #[test]
    fn from_lines_skips_blank_lines() {
        let set = TargetSet::from_lines("//a\n\n//b:c\n").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Label::normalize("//a:a").unwrap()));
    }

    #[test]
    fn from_lines_rejects_garbage() {
        assert!(TargetSet::from_lines("//a\nTarget Determinator invocation Error\n").is_err());
    }

    #[test]
    fn lossy_parse_keeps_labels_only() {
        let set = TargetSet::from_lines_lossy("//a\nTarget Determinator invocation Error\n");
        assert_eq!(set.to_string(), "{//a:a}");
    }

    #[test]
    fn serde_roundtrip_normalizes() {
        let label: Label = serde_json::from_str("\"//foo\"").unwrap();
        assert_eq!(label.as_str(), "//foo:foo");
        assert!(serde_json::from_str::<Label>("\"nope\"").is_err());
    }
}
