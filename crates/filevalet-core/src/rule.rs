//! Rules and the subject/verb/object condition model.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::ValidationError;
use crate::units::{DateUnit, SizeUnit};

/// Unique identifier for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub CompactString);

impl RuleId {
    /// Create a new RuleId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a condition inspects on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    Name,
    Extension,
    Size,
    DateCreated,
    DateModified,
    DateAccessed,
}

impl Subject {
    /// Text subjects compare strings; everything else compares magnitudes.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Name | Self::Extension)
    }

    /// Date subjects compare elapsed time.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::DateCreated | Self::DateModified | Self::DateAccessed)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Extension => write!(f, "extension"),
            Self::Size => write!(f, "size"),
            Self::DateCreated => write!(f, "date created"),
            Self::DateModified => write!(f, "date modified"),
            Self::DateAccessed => write!(f, "date accessed"),
        }
    }
}

/// How a condition compares the subject against its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    Is,
    IsNot,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
}

impl Verb {
    /// Verbs applicable to text subjects.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Is | Self::IsNot | Self::Contains | Self::NotContains)
    }

    /// Verbs applicable to size and date subjects.
    pub fn is_relational(&self) -> bool {
        matches!(self, Self::GreaterThan | Self::LessThan)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Is => write!(f, "is"),
            Self::IsNot => write!(f, "is not"),
            Self::Contains => write!(f, "contains"),
            Self::NotContains => write!(f, "does not contain"),
            Self::GreaterThan => write!(f, "is greater than"),
            Self::LessThan => write!(f, "is less than"),
        }
    }
}

/// Unit attached to a condition's object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Size(SizeUnit),
    Date(DateUnit),
}

/// One subject/verb/object comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub subject: Subject,
    pub verb: Verb,
    pub object: CompactString,
    #[serde(default)]
    pub unit: Option<Unit>,
}

impl Condition {
    /// Create a validated condition.
    pub fn new(
        subject: Subject,
        verb: Verb,
        object: impl Into<CompactString>,
        unit: Option<Unit>,
    ) -> Result<Self, ValidationError> {
        let condition = Self {
            subject,
            verb,
            object: object.into(),
            unit,
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Check verb and unit compatibility with the subject's type class.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let compatible = if self.subject.is_text() {
            self.verb.is_text()
        } else {
            self.verb.is_relational()
        };
        if !compatible {
            return Err(ValidationError::IncompatibleVerb {
                subject: self.subject,
                verb: self.verb,
            });
        }

        match (&self.unit, self.subject) {
            (None, _) => Ok(()),
            (Some(Unit::Size(_)), Subject::Size) => Ok(()),
            (Some(Unit::Date(_)), s) if s.is_date() => Ok(()),
            (Some(_), subject) => Err(ValidationError::IncompatibleUnit { subject }),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.verb, self.object)?;
        match self.unit {
            Some(Unit::Size(unit)) => write!(f, " {unit}"),
            Some(Unit::Date(unit)) => write!(f, " {unit}"),
            None => Ok(()),
        }
    }
}

/// Logical combinator across a rule's conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Every condition must match.
    All,
    /// At least one condition must match.
    Any,
}

/// One user-defined rule: an ordered set of conditions and one action.
///
/// A rule belongs to exactly one folder; ordering within the folder decides
/// precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub match_policy: MatchPolicy,
    pub conditions: Vec<Condition>,
    pub action: Action,
}

fn default_enabled() -> bool {
    true
}

impl Rule {
    /// Create a validated, enabled rule.
    pub fn new(
        id: RuleId,
        name: impl Into<String>,
        match_policy: MatchPolicy,
        conditions: Vec<Condition>,
        action: Action,
    ) -> Result<Self, ValidationError> {
        let rule = Self {
            id,
            name: name.into(),
            enabled: true,
            match_policy,
            conditions,
            action,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Validate conditions and action invariants.
    ///
    /// An empty condition list is an error, never vacuously true or false.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.conditions.is_empty() {
            return Err(ValidationError::EmptyConditions {
                rule: self.name.clone(),
            });
        }
        for condition in &self.conditions {
            condition.validate()?;
        }
        self.action.validate()
    }

    /// Disable the rule.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
