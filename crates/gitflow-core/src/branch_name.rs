//! Branch name validation and newtype.

use std::fmt;

use crate::error::Error;

/// A validated git branch name.
///
/// Enforces git's ref naming rules and rejects shell metacharacters, so a
/// name taken from the command line can safely reach the `git` binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBranchName`] if the name violates git's
    /// branch naming rules or contains dangerous characters.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        validate_branch_name(&name)?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the `BranchName` and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for BranchName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidBranchName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a branch name against git rules and security constraints.
fn validate_branch_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(invalid(name, "branch name cannot be empty"));
    }

    if name == "@" {
        return Err(invalid(name, "branch name cannot be '@'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "branch name cannot start or end with '.'"));
    }

    #[allow(clippy::case_sensitive_file_extension_comparisons)]
    if name.ends_with(".lock") {
        return Err(invalid(name, "branch name cannot end with '.lock'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "branch name cannot start or end with '/'"));
    }

    if name.starts_with('-') {
        return Err(invalid(name, "branch name cannot start with '-'"));
    }

    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_control() {
            return Err(invalid(name, "branch name cannot contain control characters"));
        }

        // Git-forbidden characters
        if matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[') {
            return Err(invalid(name, format!("branch name cannot contain '{c}'")));
        }

        // Shell metacharacters
        if matches!(
            c,
            '$' | ';'
                | '|'
                | '&'
                | '>'
                | '<'
                | '`'
                | '\\'
                | '"'
                | '\''
                | '('
                | ')'
                | '{'
                | '}'
                | '!'
        ) {
            return Err(invalid(
                name,
                format!("branch name cannot contain shell metacharacter '{c}'"),
            ));
        }

        let next = chars.get(i + 1).copied();
        if c == '.' && next == Some('.') {
            return Err(invalid(name, "branch name cannot contain '..'"));
        }
        if c == '/' && next == Some('/') {
            return Err(invalid(name, "branch name cannot contain '//'"));
        }
        if c == '/' && next == Some('.') {
            return Err(invalid(name, "branch name component cannot start with '.'"));
        }
        if c == '@' && next == Some('{') {
            return Err(invalid(name, "branch name cannot contain '@{'"));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_branch_names() {
        assert!(BranchName::new("main").is_ok());
        assert!(BranchName::new("develop").is_ok());
        assert!(BranchName::new("feature/auth").is_ok());
        assert!(BranchName::new("release/1.0.0").is_ok());
        assert!(BranchName::new("hotfix/fix-crash-42").is_ok());
        assert!(BranchName::new("feature/user/login").is_ok());
        assert!(BranchName::new("my_feature").is_ok());
    }

    #[test]
    fn test_empty_name() {
        assert!(matches!(
            BranchName::new("").unwrap_err(),
            Error::InvalidBranchName { .. }
        ));
    }

    #[test]
    fn test_dot_rules() {
        assert!(BranchName::new(".hidden").is_err());
        assert!(BranchName::new("branch.").is_err());
        assert!(BranchName::new("branch..name").is_err());
        assert!(BranchName::new("../etc/passwd").is_err());
        assert!(BranchName::new("branch.lock").is_err());
        assert!(BranchName::new("feature/.hidden").is_err());
    }

    #[test]
    fn test_slash_rules() {
        assert!(BranchName::new("/branch").is_err());
        assert!(BranchName::new("branch/").is_err());
        assert!(BranchName::new("feature//auth").is_err());
    }

    #[test]
    fn test_leading_dash() {
        assert!(BranchName::new("-D").is_err());
    }

    #[test]
    fn test_git_forbidden_characters() {
        for c in [' ', '~', '^', ':', '?', '*', '['] {
            let name = format!("branch{c}name");
            assert!(BranchName::new(&name).is_err(), "char: {c}");
        }
    }

    #[test]
    fn test_shell_metacharacters() {
        for c in [
            '$', ';', '|', '&', '>', '<', '`', '\\', '"', '\'', '(', ')', '{', '}', '!',
        ] {
            let name = format!("branch{c}name");
            assert!(BranchName::new(&name).is_err(), "char: {c}");
        }
    }

    #[test]
    fn test_at_rules() {
        assert!(BranchName::new("@").is_err());
        assert!(BranchName::new("branch@{1}").is_err());
        assert!(BranchName::new("user@feature").is_ok());
    }

    #[test]
    fn test_display_and_deref() {
        let name = BranchName::new("feature/auth").unwrap();
        assert_eq!(format!("{name}"), "feature/auth");
        assert_eq!(name.as_str(), "feature/auth");
        assert_eq!(&*name, "feature/auth");
    }
}
