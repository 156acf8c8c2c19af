//! Strongly-typed migration name carrying its parsed ordinal.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// Name of a migration unit, `<ordinal>_<description>`.
///
/// The ordinal is the leading run of ASCII digits and is parsed once at
/// construction. Names order by ordinal first, then lexically, so `9_x`
/// sorts before `010_y`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MigrationName {
    name: String,
    ordinal: u64,
}

impl MigrationName {
    /// Parse a migration name, validating the `<ordinal>_<description>` shape.
    pub fn parse(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        let invalid = |reason: &str| CoreError::InvalidMigrationName {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let digits_end = name
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(name.len());
        if digits_end == 0 {
            return Err(invalid("must start with a numeric ordinal"));
        }
        let rest = &name[digits_end..];
        let Some(description) = rest.strip_prefix('_') else {
            return Err(invalid("ordinal must be followed by '_'"));
        };
        if description.trim().is_empty() {
            return Err(invalid("description after the ordinal is empty"));
        }
        let ordinal = name[..digits_end]
            .parse::<u64>()
            .map_err(|_| invalid("ordinal is too large"))?;

        Ok(Self { name, ordinal })
    }

    /// The numeric position of this migration in the apply order.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// The human description following the ordinal prefix.
    pub fn description(&self) -> &str {
        self.name
            .split_once('_')
            .map(|(_, desc)| desc)
            .unwrap_or_default()
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Consume the wrapper and return the inner `String`.
    pub fn into_inner(self) -> String {
        self.name
    }
}

impl TryFrom<String> for MigrationName {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for MigrationName {
    type Error = CoreError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<MigrationName> for String {
    fn from(name: MigrationName) -> Self {
        name.name
    }
}

impl PartialEq for MigrationName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for MigrationName {}

impl Hash for MigrationName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Ord for MigrationName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal
            .cmp(&other.ordinal)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for MigrationName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for MigrationName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Deref for MigrationName {
    type Target = str;
    fn deref(&self) -> &str {
        &self.name
    }
}

impl Borrow<str> for MigrationName {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl PartialEq<str> for MigrationName {
    fn eq(&self, other: &str) -> bool {
        self.name == other
    }
}

impl PartialEq<&str> for MigrationName {
    fn eq(&self, other: &&str) -> bool {
        self.name == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_name() {
        let name = MigrationName::parse("006_add_username_auth").unwrap();
        assert_eq!(name.ordinal(), 6);
        assert_eq!(name.description(), "add_username_auth");
        assert_eq!(name, "006_add_username_auth");
    }

    #[test]
    fn test_parse_rejects_missing_ordinal() {
        let err = MigrationName::parse("create_tables").unwrap_err();
        assert!(matches!(err, CoreError::InvalidMigrationName { .. }));
        assert!(err.to_string().contains("numeric ordinal"));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(MigrationName::parse("001create").is_err());
        assert!(MigrationName::parse("001").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_description() {
        assert!(MigrationName::parse("001_").is_err());
        assert!(MigrationName::parse("001_  ").is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_ordinal() {
        assert!(MigrationName::parse("99999999999999999999999_big").is_err());
    }

    #[test]
    fn test_orders_by_ordinal_not_text() {
        let a = MigrationName::parse("9_nine").unwrap();
        let b = MigrationName::parse("010_ten").unwrap();
        assert!(a < b);
        assert!("9_nine" > "010_ten");
    }

    #[test]
    fn test_borrow_lookup() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(MigrationName::parse("001_init").unwrap());
        assert!(set.contains("001_init"));
    }

    #[test]
    fn test_serde_as_plain_string() {
        let name = MigrationName::parse("002_orders").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#""002_orders""#);
        let back: MigrationName = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ordinal(), 2);
        assert!(serde_json::from_str::<MigrationName>(r#""orders""#).is_err());
    }
}
