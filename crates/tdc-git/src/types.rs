//! Value types shared between the [`GitRepo`](crate::GitRepo) trait and its callers.
//!
//! Nothing here exposes gix types; the backend stays an implementation detail.

use std::fmt;

// ---------------------------------------------------------------------------
// GitOid
// ---------------------------------------------------------------------------

/// A git object identifier (SHA-1, 20 bytes).
///
/// Displays as 40 lowercase hex characters, which is also the form handed to
/// determinators as a revision argument.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitOid([u8; 20]);

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({self})")
    }
}

impl TryFrom<&[u8]> for GitOid {
    type Error = OidParseError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; 20] = raw.try_into().map_err(|_| OidParseError {
            value: format!("{} raw bytes", raw.len()),
            reason: "expected a 20-byte SHA-1 object id".to_owned(),
        })?;
        Ok(Self(bytes))
    }
}

/// Error from converting raw bytes into a [`GitOid`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OidParseError {
    /// The raw value that failed.
    pub value: String,
    /// Why it failed.
    pub reason: String,
}

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OID {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for OidParseError {}

// ---------------------------------------------------------------------------
// StatusEntry
// ---------------------------------------------------------------------------

/// One line of `git status --porcelain` output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    /// Two-letter porcelain code, e.g. `"??"` or `" M"`.
    pub code: String,
    /// Path relative to the worktree root.
    pub path: String,
}

impl StatusEntry {
    /// Whether this entry is an untracked file.
    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.code == "??"
    }

    /// Parse one porcelain v1 line. Returns `None` for malformed lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        if line.len() < 4 || !line.is_char_boundary(2) {
            return None;
        }
        let (code, rest) = line.split_at(2);
        let path = rest.strip_prefix(' ')?;
        Some(Self {
            code: code.to_owned(),
            path: path.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_displays_as_lowercase_hex() {
        let bytes: Vec<u8> = (0u8..20).map(|i| i * 13).collect();
        let oid = GitOid::try_from(bytes.as_slice()).unwrap();
        assert_eq!(oid.to_string(), "000d1a2734414e5b6875828f9ca9b6c3d0ddeaf7");
        assert_eq!(format!("{oid:?}"), format!("GitOid({oid})"));
    }

    #[test]
    fn oid_from_short_slice_fails() {
        assert!(GitOid::try_from(&[0u8; 4][..]).is_err());
    }

    #[test]
    fn status_entry_parses_untracked() {
        let entry = StatusEntry::parse("?? untracked-file").unwrap();
        assert!(entry.is_untracked());
        assert_eq!(entry.path, "untracked-file");
    }

    #[test]
    fn status_entry_parses_modified() {
        let entry = StatusEntry::parse(" M java/example/BUILD.bazel").unwrap();
        assert!(!entry.is_untracked());
        assert_eq!(entry.code, " M");
    }

    #[test]
    fn status_entry_rejects_garbage() {
        assert!(StatusEntry::parse("x").is_none());
    }
}
