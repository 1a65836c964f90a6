//! Validation rule definitions.
//!
//! These types describe the static rule catalog. The catalog itself lives in
//! the index crate; nothing here is extracted from a project.

use serde::{Deserialize, Serialize};

/// Broad grouping of validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// `required`, `nullable`, `present`, ...
    Presence,
    /// `string`, `integer`, `boolean`, ...
    Type,
    /// `alpha`, `starts_with`, ...
    String,
    /// `digits`, `multiple_of`, ...
    Numeric,
    /// `min`, `max`, `size`, `between`
    Size,
    /// `after`, `before`, `date_format`, ...
    Date,
    /// `exists`, `unique`
    Database,
    /// `file`, `image`, `mimes`, ...
    File,
    /// `same`, `different`, `confirmed`, ...
    Comparison,
    /// `email`, `url`, `uuid`, ...
    Format,
    /// `distinct`, `in_array`, ...
    Array,
    /// `required_if`, `sometimes`, ...
    Conditional,
    /// Anything else.
    Other,
}

impl RuleCategory {
    /// Returns the snake case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presence => "presence",
            Self::Type => "type",
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Size => "size",
            Self::Date => "date",
            Self::Database => "database",
            Self::File => "file",
            Self::Comparison => "comparison",
            Self::Format => "format",
            Self::Array => "array",
            Self::Conditional => "conditional",
            Self::Other => "other",
        }
    }
}

/// The kind of value a rule parameter expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// Free text.
    String,
    /// Another input field.
    Field,
    /// A database table.
    Table,
    /// A database column.
    Column,
    /// A date or relative date expression.
    Date,
    /// Comma-separated values.
    List,
    /// A regular expression.
    Regex,
}

/// One parameter of a validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationParameter {
    /// Parameter name.
    pub name: String,
    /// Expected value kind.
    pub param_type: ParamType,
    /// Whether the rule is malformed without it.
    pub required: bool,
    /// Human description.
    pub description: String,
    /// Example values.
    pub examples: Vec<String>,
}

/// A known validation rule.
///
/// # Examples
///
/// ```
/// use cv_core::{RuleCategory, ValidationRule};
///
/// let rule = ValidationRule {
///     name: "email".to_owned(),
///     category: RuleCategory::Format,
///     description: "Must be a valid email address.".to_owned(),
///     parameters: Vec::new(),
///     examples: vec!["email".to_owned()],
///     doc_url: None,
/// };
/// assert_eq!(rule.required_parameters(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Rule name as written before the `:`.
    pub name: String,
    /// Category.
    pub category: RuleCategory,
    /// Human description.
    pub description: String,
    /// Ordered parameter specs.
    pub parameters: Vec<ValidationParameter>,
    /// Example usages.
    pub examples: Vec<String>,
    /// Documentation reference.
    pub doc_url: Option<String>,
}

impl ValidationRule {
    /// Counts the parameters the rule cannot go without.
    #[must_use]
    pub fn required_parameters(&self) -> usize {
        self.parameters.iter().filter(|p| p.required).count()
    }

    /// Returns `true` if the rule takes any parameter.
    #[must_use]
    pub fn takes_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
}
