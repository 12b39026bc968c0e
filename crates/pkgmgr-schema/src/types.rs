//! Package names and lifecycle script kinds.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Errors that can occur when validating a [`PackageName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name is the empty string.
    #[error("package name is empty")]
    Empty,

    /// The name contains a path separator or NUL byte.
    #[error("package name '{0}' contains a path separator or NUL byte")]
    InvalidCharacter(String),

    /// The name is `.`/`..` or starts with a dot (reserved for index bookkeeping).
    #[error("package name '{0}' may not start with '.'")]
    Hidden(String),
}

/// A validated package name.
///
/// The name is used verbatim as a file name in both the library (with an
/// archive extension appended) and the index directory, so it must be a
/// single, non-hidden path component. Names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName(String);

impl PackageName {
    /// Validate and wrap a package name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError`] if the name is empty, contains `/` or NUL, or
    /// starts with `.`.
    pub fn new(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.contains(['/', '\0']) {
            return Err(NameError::InvalidCharacter(name.to_string()));
        }
        if name.starts_with(crate::HIDDEN_PREFIX) {
            return Err(NameError::Hidden(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PackageName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for PackageName {
    type Error = NameError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<std::ffi::OsStr> for PackageName {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}

impl AsRef<Path> for PackageName {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One of the four reserved lifecycle script names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptKind {
    /// Runs before anything is written to the system root.
    PreInstall,
    /// Runs after every regular member has been materialized.
    PostInstall,
    /// Runs before any owned path is removed.
    PreUninstall,
    /// Runs after the owned paths have been removed.
    PostUninstall,
}

impl ScriptKind {
    /// All script kinds, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::PreInstall,
        Self::PostInstall,
        Self::PreUninstall,
        Self::PostUninstall,
    ];

    /// Extension accepted after the reserved basename.
    pub const EXTENSION: &'static str = "sh";

    /// The reserved basename (without extension).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreInstall => "pre-install",
            Self::PostInstall => "post-install",
            Self::PreUninstall => "pre-uninstall",
            Self::PostUninstall => "post-uninstall",
        }
    }

    /// Classify an archive member's file name.
    ///
    /// Matches `pre-install` and `pre-install.sh` (and likewise for the other
    /// kinds) exactly; anything else is a regular member.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = match file_name.rsplit_once('.') {
            Some((stem, ext)) if ext == Self::EXTENSION => stem,
            Some(_) => return None,
            None => file_name,
        };
        Self::ALL.into_iter().find(|kind| kind.as_str() == stem)
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
