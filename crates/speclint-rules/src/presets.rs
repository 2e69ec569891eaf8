//! Built-in rulesets compiled into the binary.

use speclint_core::ruleset::{load_ruleset_from_str, LoadRulesetError};
use speclint_core::Ruleset;

/// Rulesets available under the `speclint:` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// OpenAPI 2.0 and 3.x rules.
    Oas,
}

impl Builtin {
    /// Every built-in ruleset.
    pub const ALL: &'static [Self] = &[Self::Oas];

    /// Returns the name used to reference this ruleset.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Oas => "speclint:oas",
        }
    }

    /// Returns the ruleset text.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::Oas => include_str!("rulesets/oas.yaml"),
        }
    }

    /// Looks up a built-in by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Parses this built-in into a ruleset.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded ruleset is invalid.
    pub fn ruleset(self) -> Result<Ruleset, LoadRulesetError> {
        load_ruleset_from_str(self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_loads() {
        for builtin in Builtin::ALL {
            let ruleset = builtin.ruleset().unwrap();
            assert!(!ruleset.is_empty(), "{} has no rules", builtin.name());
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Builtin::from_name("speclint:oas"), Some(Builtin::Oas));
        assert_eq!(Builtin::from_name("speclint:asyncapi"), None);
    }

    #[test]
    fn oas_recommended_set() {
        let ruleset = Builtin::Oas.ruleset().unwrap();
        assert!(ruleset.get("info-contact").unwrap().is_enabled());
        assert!(!ruleset.get("info-license").unwrap().is_enabled());
        assert!(ruleset.rules().len() > ruleset.enabled_count());
    }
}
