//! Watched folders and the rules scoped to them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::rule::Rule;

/// One watched folder and its ordered rule list.
///
/// The external configuration layer owns folder lifecycle; the monitor is
/// informed of every add and remove.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// Absolute path of the folder.
    pub path: PathBuf,
    /// Watch and scan subdirectories too.
    #[serde(default)]
    pub recursive: bool,
    /// Rules scoped to this folder, in precedence order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Folder {
    /// Create a folder with no rules.
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
            rules: Vec::new(),
        }
    }

    /// Attach rules in precedence order.
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    /// Validate the folder path and every scoped rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.path.is_absolute() {
            return Err(ValidationError::RelativeFolderPath {
                path: self.path.display().to_string(),
            });
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Rules that are currently enabled, in precedence order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::rule::{Condition, MatchPolicy, RuleId, Subject, Verb};

    #[test]
    fn test_relative_path_rejected() {
        let folder = Folder::new("downloads", false);
        assert!(matches!(
            folder.validate(),
            Err(ValidationError::RelativeFolderPath { .. })
        ));
    }

    #[test]
    fn test_enabled_rules_filters() {
        let condition = Condition::new(Subject::Extension, Verb::Is, "log", None).unwrap();
        let active = Rule::new(
            RuleId::new("a"),
            "active",
            MatchPolicy::All,
            vec![condition.clone()],
            Action::recycle(),
        )
        .unwrap();
        let inactive = Rule::new(
            RuleId::new("b"),
            "inactive",
            MatchPolicy::All,
            vec![condition],
            Action::recycle(),
        )
        .unwrap()
        .disabled();

        let folder = Folder::new("/tmp/downloads", false).with_rules(vec![active, inactive]);
        let enabled: Vec<_> = folder.enabled_rules().collect();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "active");
    }
}
