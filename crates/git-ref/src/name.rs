use std::fmt;

use bstr::{BStr, BString, ByteSlice};

use crate::error::RefError;

/// A validated reference name.
///
/// Enforces all rules from `git-check-ref-format(1)`:
/// - No double dots `..`
/// - No ASCII control characters or space, `~`, `^`, `:`, `?`, `*`, `[`, `\`
/// - Cannot begin or end with `/`, or contain `//`
/// - Cannot end with `.`
/// - Cannot end with `.lock`
/// - Cannot contain `@{`
/// - Cannot be the single character `@`
/// - Cannot contain a NUL byte
/// - Must have at least one `/` (for full refs like `refs/heads/main`),
///   unless it is a special ref like `HEAD`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefName(BString);

/// Characters forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[u8] = b" ~^:?*[\\";

/// Special ref names that are valid without a `/`.
const SPECIAL_REFS: &[&str] = &[
    "HEAD",
    "MERGE_HEAD",
    "CHERRY_PICK_HEAD",
    "REVERT_HEAD",
    "BISECT_HEAD",
    "ORIG_HEAD",
    "FETCH_HEAD",
    "AUTO_MERGE",
    "REBASE_HEAD",
];

impl RefName {
    /// Create and validate a ref name according to git-check-ref-format rules.
    pub fn new(name: impl Into<BString>) -> Result<Self, RefError> {
        let name = name.into();
        validate_ref_name(&name)?;
        Ok(Self(name))
    }

    /// Create without validation (for internal use with known-good names).
    pub(crate) fn new_unchecked(name: impl Into<BString>) -> Self {
        Self(name.into())
    }

    /// Get the short name (e.g., `main` from `refs/heads/main`).
    pub fn short_name(&self) -> &BStr {
        const STRIPPABLE_PREFIXES: &[&[u8]] =
            &[b"refs/heads/", b"refs/tags/", b"refs/remotes/"];

        let s = self.0.as_bstr();
        STRIPPABLE_PREFIXES
            .iter()
            .find_map(|prefix| s.strip_prefix(*prefix))
            .map(|rest| rest.as_bstr())
            .unwrap_or(s)
    }

    /// Is this under `refs/heads/`?
    pub fn is_branch(&self) -> bool {
        self.0.starts_with(b"refs/heads/")
    }

    /// Is this under `refs/tags/`?
    pub fn is_tag(&self) -> bool {
        self.0.starts_with(b"refs/tags/")
    }

    /// Is this under `refs/remotes/`?
    pub fn is_remote(&self) -> bool {
        self.0.starts_with(b"refs/remotes/")
    }

    /// Is this a special ref (HEAD, MERGE_HEAD, etc.)?
    pub fn is_special(&self) -> bool {
        let s = self.0.to_str_lossy();
        SPECIAL_REFS.contains(&s.as_ref())
    }

    /// Get the raw bytes of this ref name.
    pub fn as_bstr(&self) -> &BStr {
        self.0.as_bstr()
    }

    /// Get as a string slice (ref names are always valid UTF-8 in practice).
    pub fn as_str(&self) -> &str {
        // Ref names validated by git are always ASCII/UTF-8
        std::str::from_utf8(&self.0).unwrap_or("<invalid-utf8>")
    }

    /// Get the inner BString.
    pub fn into_inner(self) -> BString {
        self.0
    }
}

impl AsRef<BStr> for RefName {
    fn as_ref(&self) -> &BStr {
        self.0.as_bstr()
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A whole-name substring whose presence anywhere makes the name invalid.
const FORBIDDEN_SUBSTRINGS: &[(&[u8], &str)] = &[
    (b"..", "contains '..'"),
    (b"//", "contains '//'"),
    (b"@{", "contains '@{'"),
];

fn invalid(name_str: &str, reason: impl AsRef<str>) -> RefError {
    RefError::InvalidName(format!("'{}': {}", name_str, reason.as_ref()))
}

/// Validate a ref name per git-check-ref-format rules.
fn validate_ref_name(name: &[u8]) -> Result<(), RefError> {
    if name.is_empty() {
        return Err(RefError::InvalidName("ref name is empty".into()));
    }
    if name == b"@" {
        return Err(RefError::InvalidName("'@' is not a valid ref name".into()));
    }

    let name_str = String::from_utf8_lossy(name).into_owned();

    if name.contains(&0) {
        return Err(invalid(&name_str, "contains NUL byte"));
    }

    for (i, &b) in name.iter().enumerate() {
        if b < 0x20 || b == 0x7f {
            return Err(invalid(&name_str, format!("contains control character at position {}", i)));
        }
        if FORBIDDEN_CHARS.contains(&b) {
            return Err(invalid(
                &name_str,
                format!("contains forbidden character '{}' at position {}", b as char, i),
            ));
        }
    }

    if name.starts_with(b".") {
        return Err(invalid(&name_str, "starts with '.'"));
    }
    if name.starts_with(b"/") {
        return Err(invalid(&name_str, "starts with '/'"));
    }
    if name.ends_with(b"/") {
        return Err(invalid(&name_str, "ends with '/'"));
    }
    if name.ends_with(b".") {
        return Err(invalid(&name_str, "ends with '.'"));
    }
    if name.ends_with(b".lock") {
        return Err(invalid(&name_str, "ends with '.lock'"));
    }

    for (needle, reason) in FORBIDDEN_SUBSTRINGS {
        if name.find(needle).is_some() {
            return Err(invalid(&name_str, *reason));
        }
    }

    for component in name.split_str(b"/") {
        if component.starts_with(b".") {
            return Err(invalid(&name_str, "component starts with '.'"));
        }
        if component.ends_with(b".lock") {
            return Err(invalid(&name_str, "component ends with '.lock'"));
        }
    }

    Ok(())
}
