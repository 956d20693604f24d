//! Tolerant comparison of a reported target set against expectations.
//!
//! Every expected target must be reported and no forbidden target may be
//! reported. Targets reported beyond the expected set ("extras") are
//! over-building: a failure by default, a warning when the global
//! over-building valve is open, and *required* when a scenario declares that
//! it tolerates over-building. The last rule flags stale tolerances once an
//! adapter stops over-reporting.

use std::fmt;

use crate::label::{InvalidLabelError, TargetSet};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Run-wide matching policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    /// The global over-building valve (`ALLOW_OVER_BUILDING=true`): extras
    /// in scenarios without an over-building tolerance become warnings.
    pub allow_over_building: bool,
}

// ---------------------------------------------------------------------------
// Expectation
// ---------------------------------------------------------------------------

/// What one determination is expected to report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetExpectation {
    pub expected: TargetSet,
    pub forbidden: TargetSet,
    pub allow_over_builds: bool,
}

impl TargetExpectation {
    /// Build an expectation from raw label strings.
    ///
    /// # Errors
    /// Fails if any expected or forbidden string is not a label.
    pub fn parse(
        expected: &[&str],
        forbidden: &[&str],
        allow_over_builds: bool,
    ) -> Result<Self, InvalidLabelError> {
        Ok(Self {
            expected: TargetSet::parse(expected.iter().copied())?,
            forbidden: TargetSet::parse(forbidden.iter().copied())?,
            allow_over_builds,
        })
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A successful match, with any extras tolerated along the way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// `actual − expected`. Non-empty only when over-building was tolerated.
    pub extra: TargetSet,
    /// Warnings produced by the global over-building valve.
    pub warnings: Vec<String>,
}

/// Which rule a reported set broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Expected targets were not reported.
    Missing,
    /// Forbidden targets were reported.
    Forbidden,
    /// Targets beyond the expected set were reported.
    OverBuilt,
    /// Over-building was tolerated but the adapter reported no extras.
    StaleTolerance,
}

/// A reported set that does not satisfy its expectation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchViolation {
    /// The first rule broken, in the order the rules are checked.
    pub kind: ViolationKind,
    pub actual: TargetSet,
    pub missing: TargetSet,
    pub extra: TargetSet,
    pub forbidden_hit: TargetSet,
}

impl fmt::Display for MatchViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Missing => {
                write!(f, "targets were not detected which should have been")?;
            }
            ViolationKind::Forbidden => write!(f, "forbidden targets were detected")?,
            ViolationKind::OverBuilt => {
                write!(f, "extra targets were detected, which causes over-building")?;
            }
            ViolationKind::StaleTolerance => {
                write!(f, "over-building is tolerated but none was done")?;
            }
        }
        if !self.missing.is_empty() {
            write!(f, "; missing: {}", self.missing)?;
        }
        if !self.forbidden_hit.is_empty() {
            write!(f, "; forbidden: {}", self.forbidden_hit)?;
        }
        if !self.extra.is_empty() {
            write!(f, "; extra: {}", self.extra)?;
        }
        write!(f, "; reported: {}", self.actual)
    }
}

impl std::error::Error for MatchViolation {}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Compare `actual` against `expectation`.
///
/// Rules, checked in order:
/// 1. `expected − actual` must be empty.
/// 2. `(actual − expected) ∩ forbidden` must be empty.
/// 3. Without `allow_over_builds`, `actual − expected` must be empty unless
///    the policy's valve is open, in which case extras are a warning.
/// 4. With `allow_over_builds`, `actual − expected` must be non-empty.
///
/// # Errors
/// Returns the first broken rule as a [`MatchViolation`].
pub fn match_targets(
    actual: &TargetSet,
    expectation: &TargetExpectation,
    policy: MatchPolicy,
) -> Result<MatchOutcome, MatchViolation> {
    let missing = expectation.expected.difference(actual);
    let extra = actual.difference(&expectation.expected);
    let forbidden_hit = extra.intersection(&expectation.forbidden);

    let kind = if !missing.is_empty() {
        Some(ViolationKind::Missing)
    } else if !forbidden_hit.is_empty() {
        Some(ViolationKind::Forbidden)
    } else if expectation.allow_over_builds {
        extra.is_empty().then_some(ViolationKind::StaleTolerance)
    } else if !extra.is_empty() && !policy.allow_over_building {
        Some(ViolationKind::OverBuilt)
    } else {
        None
    };

    if let Some(kind) = kind {
        return Err(MatchViolation {
            kind,
            actual: actual.clone(),
            missing,
            extra,
            forbidden_hit,
        });
    }

    let mut warnings = Vec::new();
    if !expectation.allow_over_builds && !extra.is_empty() {
        warnings.push(format!("over-building tolerated by policy: {extra}"));
    }
    Ok(MatchOutcome { extra, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> TargetSet {
        TargetSet::parse(labels.iter().copied()).unwrap()
    }

    fn expect(expected: &[&str], forbidden: &[&str], allow: bool) -> TargetExpectation {
        TargetExpectation::parse(expected, forbidden, allow).unwrap()
    }

    const STRICT: MatchPolicy = MatchPolicy {
        allow_over_building: false,
    };
    const LENIENT: MatchPolicy = MatchPolicy {
        allow_over_building: true,
    };

    #[test]
    fn exact_match_passes() {
        let actual = set(&["//java/example:OtherExampleTest"]);
        let outcome = match_targets(
            &actual,
            &expect(&["//java/example:OtherExampleTest"], &[], false),
            STRICT,
        )
        .unwrap();
        assert!(outcome.extra.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn short_labels_match_long_labels() {
        let actual = set(&["//java/example/simple:simple"]);
        match_targets(&actual, &expect(&["//java/example/simple"], &[], false), STRICT).unwrap();
    }

    #[test]
    fn missing_target_fails_even_when_lenient() {
        let actual = set(&["//a:a"]);
        let err = match_targets(&actual, &expect(&["//a:a", "//b:b"], &[], true), LENIENT)
            .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Missing);
        assert_eq!(err.missing, set(&["//b:b"]));
    }

    #[test]
    fn forbidden_hit_fails() {
        let actual = set(&["//java/example:OtherExampleTest"]);
        let err = match_targets(
            &actual,
            &expect(&[], &["//java/example:OtherExampleTest"], false),
            LENIENT,
        )
        .unwrap_err();
        assert_eq!(err.kind, ViolationKind::Forbidden);
        assert!(err.to_string().contains("forbidden: {//java/example:OtherExampleTest}"));
    }

    #[test]
    fn extras_fail_without_tolerance() {
        let actual = set(&["//a:a", "//sh:sh_test"]);
        let err = match_targets(&actual, &expect(&["//a:a"], &[], false), STRICT).unwrap_err();
        assert_eq!(err.kind, ViolationKind::OverBuilt);
        assert_eq!(err.extra, set(&["//sh:sh_test"]));
    }

    #[test]
    fn valve_turns_extras_into_warnings() {
        let actual = set(&["//a:a", "//sh:sh_test"]);
        let outcome = match_targets(&actual, &expect(&["//a:a"], &[], false), LENIENT).unwrap();
        assert_eq!(outcome.extra, set(&["//sh:sh_test"]));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn tolerance_requires_extras() {
        let actual = set(&["//a:a"]);
        let err = match_targets(&actual, &expect(&["//a:a"], &[], true), STRICT).unwrap_err();
        assert_eq!(err.kind, ViolationKind::StaleTolerance);

        // The valve does not excuse a stale tolerance either.
        let err = match_targets(&actual, &expect(&["//a:a"], &[], true), LENIENT).unwrap_err();
        assert_eq!(err.kind, ViolationKind::StaleTolerance);
    }

    #[test]
    fn tolerance_with_extras_passes_without_warning() {
        let actual = set(&["//a:a", "//b:b"]);
        let outcome = match_targets(&actual, &expect(&["//a:a"], &[], true), STRICT).unwrap();
        assert_eq!(outcome.extra, set(&["//b:b"]));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn forbidden_expected_target_is_not_a_hit() {
        // Only extras can hit the forbidden set.
        let actual = set(&["//a:a"]);
        match_targets(&actual, &expect(&["//a:a"], &["//a:a"], false), STRICT).unwrap();
    }

    #[test]
    fn violation_display_lists_sets() {
        let actual = set(&["//x:x"]);
        let err = match_targets(&actual, &expect(&["//y:y"], &[], false), STRICT).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing: {//y:y}"), "{msg}");
        assert!(msg.contains("extra: {//x:x}"), "{msg}");
        assert!(msg.contains("reported: {//x:x}"), "{msg}");
    }
}
