//! Target-version constraint matching.
//!
//! Releases declare which client app versions they apply to, either as an
//! exact version or as a semver range (`1.2.x`, `>=1.0.0 <2.0.0`, ...).
//! A client version that does not parse as semver only ever matches an
//! exact constraint equal to it verbatim -- it never silently satisfies a
//! range. A stored constraint that does not parse is a data integrity
//! problem on that release, not a reason to fail the whole resolution.

use semver::{Version, VersionReq};

use crate::error::CoreError;

/// How to treat a release whose target-version constraint is missing or
/// empty. The upstream behavior is ambiguous, so this is configurable;
/// [`EmptyTargetPolicy::MatchAny`] is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyTargetPolicy {
    /// An empty constraint matches every client version.
    #[default]
    MatchAny,
    /// An empty constraint matches no client version.
    MatchNone,
}

/// Whether `client_version` satisfies `constraint`.
///
/// Returns `Err(CoreError::DataIntegrity)` when the stored constraint is
/// unparseable; callers treat that release as ineligible.
pub fn matches(
    client_version: &str,
    constraint: &str,
    empty_policy: EmptyTargetPolicy,
) -> Result<bool, CoreError> {
    let constraint = constraint.trim();
    if constraint.is_empty() {
        return Ok(empty_policy == EmptyTargetPolicy::MatchAny);
    }

    // Verbatim equality always matches and requires nothing to parse.
    let client_version = client_version.trim();
    if client_version == constraint {
        return Ok(true);
    }

    let Ok(client) = Version::parse(client_version) else {
        // Unparseable client version: only the verbatim check above may
        // match; ranges are off the table.
        return Ok(false);
    };

    // Exact constraint, possibly written differently (e.g. "1.0" vs "1.0.0").
    if let Ok(exact) = Version::parse(constraint) {
        return Ok(client == exact);
    }

    let req = VersionReq::parse(constraint).map_err(|e| {
        CoreError::DataIntegrity(format!(
            "Unparseable target version constraint '{constraint}': {e}"
        ))
    })?;
    Ok(req.matches(&client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ANY: EmptyTargetPolicy = EmptyTargetPolicy::MatchAny;
    const NONE: EmptyTargetPolicy = EmptyTargetPolicy::MatchNone;

    #[test]
    fn exact_version_matches_itself() {
        assert!(matches("1.0.0", "1.0.0", ANY).unwrap());
        assert!(!matches("1.0.1", "1.0.0", ANY).unwrap());
    }

    #[test]
    fn range_constraints_match() {
        assert!(matches("1.5.0", ">=1.0.0, <2.0.0", ANY).unwrap());
        assert!(!matches("2.0.0", ">=1.0.0, <2.0.0", ANY).unwrap());
        assert!(matches("1.2.9", "~1.2", ANY).unwrap());
        assert!(matches("1.9.0", "^1.2", ANY).unwrap());
        assert!(!matches("2.0.0", "^1.2", ANY).unwrap());
    }

    #[test]
    fn prerelease_versions_compare() {
        assert!(matches("1.0.0-beta.2", "1.0.0-beta.2", ANY).unwrap());
        assert!(!matches("1.0.0-beta.2", "1.0.0", ANY).unwrap());
    }

    #[test]
    fn unparseable_client_version_only_matches_verbatim() {
        assert!(matches("not-a-version", "not-a-version", ANY).unwrap());
        assert!(!matches("not-a-version", ">=1.0.0", ANY).unwrap());
        assert!(!matches("not-a-version", "1.0.0", ANY).unwrap());
    }

    #[test]
    fn unparseable_constraint_is_data_integrity_error() {
        let err = matches("1.0.0", "definitely !! broken", ANY).unwrap_err();
        assert_matches!(err, CoreError::DataIntegrity(_));
    }

    #[test]
    fn empty_constraint_follows_policy() {
        assert!(matches("1.0.0", "", ANY).unwrap());
        assert!(matches("1.0.0", "   ", ANY).unwrap());
        assert!(!matches("1.0.0", "", NONE).unwrap());
    }

    #[test]
    fn loosely_written_exact_constraint() {
        // semver's VersionReq treats a bare "1.0" as a caret range, but an
        // explicit full version must stay an equality check.
        assert!(matches("1.0.0", "1.0.0", ANY).unwrap());
        assert!(matches("1.5.0", "1.0", ANY).unwrap()); // range semantics
    }
}
