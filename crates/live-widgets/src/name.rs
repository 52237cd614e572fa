//! Validated widget names.

use std::{fmt, str::FromStr};

use convert_case::{Case, Casing};

use crate::{error, error::Result};

/// Return true if the character is valid in a widget name.
pub fn valid_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

/// Return true if the full name is valid.
pub fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(valid_name_char)
}

/// A widget name, which consists of lowercase ASCII alphanumeric characters,
/// plus underscores and hyphens. Names key the registry and appear verbatim in
/// `data-widget` markup attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetName {
    /// Stored name string.
    name: String,
}

impl FromStr for WidgetName {
    type Err = error::Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl WidgetName {
    /// Create a new WidgetName, returning an error if the string is empty or
    /// contains invalid characters.
    fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(error::Error::MissingName);
        }
        if !valid_name(name) {
            return Err(error::Error::InvalidName(name.into()));
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    /// Takes a string and munges it into a valid widget name. It does this by
    /// first converting the string to kebab case, then removing all invalid
    /// characters.
    pub fn convert(name: &str) -> Self {
        let raw = name.to_case(Case::Kebab);
        let filtered: String = raw.chars().filter(|x| valid_name_char(*x)).collect();
        let name = if filtered.is_empty() {
            "widget".to_string()
        } else {
            filtered
        };
        Self { name }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for WidgetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq<&str> for WidgetName {
    fn eq(&self, other: &&str) -> bool {
        self.name == *other
    }
}

impl PartialEq<String> for WidgetName {
    fn eq(&self, other: &String) -> bool {
        self.name == *other
    }
}

/// Converts a string into the standard widget name format, and errors if it
/// doesn't comply to the naming standard.
impl TryFrom<&str> for WidgetName {
    type Error = error::Error;
    fn try_from(name: &str) -> Result<Self> {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_name_chars() {
        assert!(valid_name_char('a'));
        assert!(valid_name_char('0'));
        assert!(valid_name_char('_'));
        assert!(valid_name_char('-'));
        assert!(!valid_name_char('A'));
        assert!(!valid_name_char(' '));
        assert!(!valid_name(""));
        assert!(valid_name("event-trigger"));
    }

    #[test]
    fn name_convert() {
        assert_eq!(WidgetName::try_from("drawer").unwrap(), "drawer");
        assert!(WidgetName::try_from("Drawer").is_err());
        assert!(matches!(
            WidgetName::try_from(""),
            Err(error::Error::MissingName)
        ));
        assert_eq!(WidgetName::convert("EventTrigger"), "event-trigger");
        assert_eq!(WidgetName::convert("!!!"), "widget");
    }
}
