//! The validation rule registry and project rule diagnostics.
//!
//! The registry is reference data: a hand-curated catalog of rule
//! definitions plus a mutual-exclusion table, built once when the engine
//! starts. On top of it sit three services:
//!
//! - [`RuleRegistry::compatible_rules`] filters candidates against the rules
//!   already applied to a field
//! - [`RuleRegistry::suggest`] pre-fills parameters from the field name
//! - [`RuleRegistry::diagnose`] checks a rule string against the catalog and
//!   the known migration tables
//!
//! [`ValidationIndex`] holds the diagnosed rule usages found in the project.

use camino::{Utf8Path, Utf8PathBuf};
use cv_core::{
    FxHashMap, ParamType, RuleCategory, SourceLocation, ValidationConfig, ValidationParameter,
    ValidationRule,
};
use cv_extract::RuleUsage;
use cv_extract::text::{pluralize, split_rule_string};
use serde::Serialize;

const DOC_BASE: &str = "https://laravel.com/docs/validation#rule-";

struct ParamSpec {
    name: &'static str,
    param_type: ParamType,
    required: bool,
    description: &'static str,
    example: &'static str,
}

const fn param(
    name: &'static str,
    param_type: ParamType,
    required: bool,
    description: &'static str,
    example: &'static str,
) -> ParamSpec {
    ParamSpec {
        name,
        param_type,
        required,
        description,
        example,
    }
}

struct RuleSpec {
    name: &'static str,
    category: RuleCategory,
    description: &'static str,
    params: &'static [ParamSpec],
}

const fn rule(
    name: &'static str,
    category: RuleCategory,
    description: &'static str,
    params: &'static [ParamSpec],
) -> RuleSpec {
    RuleSpec {
        name,
        category,
        description,
        params,
    }
}

use ParamType as P;
use RuleCategory as C;

const VALUE: ParamSpec = param("value", P::Number, true, "Size limit", "255");
const OTHER_FIELD: ParamSpec = param("field", P::Field, true, "Field to compare against", "password");
const DATE_PARAM: ParamSpec = param("date", P::Date, true, "Date or another date field", "today");
const VALUES: ParamSpec = param("values", P::List, true, "Allowed values", "draft,published");

#[rustfmt::skip]
const CATALOG: &[RuleSpec] = &[
    // Presence
    rule("required", C::Presence, "The field must be present and not empty.", &[]),
    rule("nullable", C::Presence, "The field may be null.", &[]),
    rule("present", C::Presence, "The field must be present but may be empty.", &[]),
    rule("filled", C::Presence, "The field must not be empty when present.", &[]),
    rule("missing", C::Presence, "The field must not be present.", &[]),
    rule("prohibited", C::Presence, "The field must be missing or empty.", &[]),
    rule("accepted", C::Presence, "The field must be yes, on, 1 or true.", &[]),
    rule("declined", C::Presence, "The field must be no, off, 0 or false.", &[]),
    // Conditional
    rule("sometimes", C::Conditional, "Validate only when the field is present.", &[]),
    rule("required_if", C::Conditional, "Required when another field equals a value.", &[
        param("field", P::Field, true, "Field to inspect", "type"),
        param("value", P::String, true, "Value that triggers the requirement", "business"),
    ]),
    rule("required_unless", C::Conditional, "Required unless another field equals a value.", &[
        param("field", P::Field, true, "Field to inspect", "type"),
        param("value", P::String, true, "Value that lifts the requirement", "personal"),
    ]),
    rule("required_with", C::Conditional, "Required when any of the other fields is present.", &[
        param("fields", P::List, true, "Other fields", "first_name,last_name"),
    ]),
    rule("required_without", C::Conditional, "Required when any of the other fields is absent.", &[
        param("fields", P::List, true, "Other fields", "email"),
    ]),
    rule("prohibited_if", C::Conditional, "Prohibited when another field equals a value.", &[
        param("field", P::Field, true, "Field to inspect", "type"),
        param("value", P::String, true, "Value that triggers the prohibition", "guest"),
    ]),
    rule("exclude_if", C::Conditional, "Excluded from validated data when another field equals a value.", &[
        param("field", P::Field, true, "Field to inspect", "has_appointment"),
        param("value", P::String, true, "Value that triggers exclusion", "false"),
    ]),
    // Type
    rule("string", C::Type, "The field must be a string.", &[]),
    rule("integer", C::Type, "The field must be an integer.", &[]),
    rule("numeric", C::Type, "The field must be numeric.", &[]),
    rule("boolean", C::Type, "The field must be castable to a boolean.", &[]),
    rule("array", C::Type, "The field must be an array.", &[
        param("keys", P::List, false, "Allowed keys", "name,email"),
    ]),
    rule("decimal", C::Type, "The field must be numeric with the given decimal places.", &[
        param("min", P::Integer, true, "Minimum decimal places", "2"),
        param("max", P::Integer, false, "Maximum decimal places", "4"),
    ]),
    // String
    rule("alpha", C::String, "Only alphabetic characters.", &[]),
    rule("alpha_num", C::String, "Only alphanumeric characters.", &[]),
    rule("alpha_dash", C::String, "Alphanumeric characters, dashes and underscores.", &[]),
    rule("lowercase", C::String, "The field must be lowercase.", &[]),
    rule("uppercase", C::String, "The field must be uppercase.", &[]),
    rule("starts_with", C::String, "The field must start with one of the values.", &[
        param("values", P::List, true, "Allowed prefixes", "http,https"),
    ]),
    rule("ends_with", C::String, "The field must end with one of the values.", &[
        param("values", P::List, true, "Allowed suffixes", ".com,.org"),
    ]),
    // Size
    rule("min", C::Size, "Minimum size, length, or value.", &[VALUE]),
    rule("max", C::Size, "Maximum size, length, or value.", &[VALUE]),
    rule("size", C::Size, "Exact size, length, or value.", &[VALUE]),
    rule("between", C::Size, "Size between the given bounds.", &[
        param("min", P::Number, true, "Lower bound", "1"),
        param("max", P::Number, true, "Upper bound", "10"),
    ]),
    // Numeric
    rule("digits", C::Numeric, "Numeric with an exact number of digits.", &[
        param("length", P::Integer, true, "Number of digits", "4"),
    ]),
    rule("digits_between", C::Numeric, "Numeric with a digit count between bounds.", &[
        param("min", P::Integer, true, "Fewest digits", "4"),
        param("max", P::Integer, true, "Most digits", "6"),
    ]),
    rule("multiple_of", C::Numeric, "The field must be a multiple of the value.", &[
        param("value", P::Number, true, "Divisor", "5"),
    ]),
    rule("gt", C::Numeric, "Greater than another field.", &[OTHER_FIELD]),
    rule("gte", C::Numeric, "Greater than or equal to another field.", &[OTHER_FIELD]),
    rule("lt", C::Numeric, "Less than another field.", &[OTHER_FIELD]),
    rule("lte", C::Numeric, "Less than or equal to another field.", &[OTHER_FIELD]),
    // Date
    rule("date", C::Date, "A valid date.", &[]),
    rule("date_format", C::Date, "A date matching one of the formats.", &[
        param("format", P::String, true, "Date format", "Y-m-d"),
    ]),
    rule("after", C::Date, "A date after the given date.", &[DATE_PARAM]),
    rule("after_or_equal", C::Date, "A date on or after the given date.", &[DATE_PARAM]),
    rule("before", C::Date, "A date before the given date.", &[DATE_PARAM]),
    rule("before_or_equal", C::Date, "A date on or before the given date.", &[DATE_PARAM]),
    rule("date_equals", C::Date, "A date equal to the given date.", &[DATE_PARAM]),
    rule("timezone", C::Date, "A valid timezone identifier.", &[]),
    // Database
    rule("exists", C::Database, "The value must exist in a database table.", &[
        param("table", P::Table, true, "Table to search", "users"),
        param("column", P::Column, false, "Column to match", "id"),
    ]),
    rule("unique", C::Database, "The value must not exist in a database table.", &[
        param("table", P::Table, true, "Table to search", "users"),
        param("column", P::Column, false, "Column to match", "email"),
        param("except", P::String, false, "Id to ignore", "1"),
        param("id_column", P::Column, false, "Id column of the ignored row", "id"),
    ]),
    // File
    rule("file", C::File, "A successfully uploaded file.", &[]),
    rule("image", C::File, "An image file.", &[]),
    rule("mimes", C::File, "A file with one of the extensions.", &[
        param("extensions", P::List, true, "Allowed extensions", "jpg,png,pdf"),
    ]),
    rule("mimetypes", C::File, "A file with one of the MIME types.", &[
        param("types", P::List, true, "Allowed MIME types", "video/mp4"),
    ]),
    rule("extensions", C::File, "A file whose extension is listed.", &[
        param("extensions", P::List, true, "Allowed extensions", "csv,txt"),
    ]),
    rule("dimensions", C::File, "An image meeting dimension constraints.", &[
        param("constraints", P::String, true, "Dimension constraints", "min_width=100"),
    ]),
    // Comparison
    rule("confirmed", C::Comparison, "Must match the `<field>_confirmation` field.", &[]),
    rule("same", C::Comparison, "Must match another field.", &[OTHER_FIELD]),
    rule("different", C::Comparison, "Must differ from another field.", &[OTHER_FIELD]),
    rule("in", C::Comparison, "Must be one of the listed values.", &[VALUES]),
    rule("not_in", C::Comparison, "Must not be one of the listed values.", &[VALUES]),
    // Format
    rule("email", C::Format, "A valid email address.", &[]),
    rule("url", C::Format, "A valid URL.", &[]),
    rule("active_url", C::Format, "A URL with a resolvable host.", &[]),
    rule("ip", C::Format, "A valid IP address.", &[]),
    rule("ipv4", C::Format, "A valid IPv4 address.", &[]),
    rule("ipv6", C::Format, "A valid IPv6 address.", &[]),
    rule("mac_address", C::Format, "A valid MAC address.", &[]),
    rule("json", C::Format, "A valid JSON string.", &[]),
    rule("uuid", C::Format, "A valid UUID.", &[]),
    rule("ulid", C::Format, "A valid ULID.", &[]),
    rule("regex", C::Format, "Must match the regular expression.", &[
        param("pattern", P::Regex, true, "Pattern", "/^[a-z]+$/"),
    ]),
    rule("not_regex", C::Format, "Must not match the regular expression.", &[
        param("pattern", P::Regex, true, "Pattern", "/^.+$/i"),
    ]),
    // Array
    rule("distinct", C::Array, "Array values must be unique.", &[]),
    rule("list", C::Array, "An array with consecutive keys from zero.", &[]),
    rule("in_array", C::Array, "Must exist in another field's values.", &[
        param("field", P::Field, true, "Field holding the values", "tags.*"),
    ]),
    rule("required_array_keys", C::Array, "The array must contain the keys.", &[
        param("keys", P::List, true, "Required keys", "name,email"),
    ]),
    // Other
    rule("bail", C::Other, "Stop validating the field after the first failure.", &[]),
    rule("exclude", C::Other, "Exclude the field from validated data.", &[]),
];

/// Declared in one direction only; [`RuleRegistry::conflicts`] checks both.
const EXCLUSIONS: &[(&str, &[&str])] = &[
    ("string", &["numeric", "integer", "boolean", "array", "file", "image"]),
    ("numeric", &["boolean", "array", "file", "image"]),
    ("integer", &["boolean", "array", "file", "image", "decimal"]),
    ("boolean", &["array", "file", "image"]),
    ("array", &["file", "image"]),
    ("required", &["nullable", "prohibited", "missing"]),
    ("present", &["missing"]),
    ("accepted", &["declined"]),
];

fn parse_rule(rule: &str) -> (&str, Vec<&str>) {
    match rule.split_once(':') {
        // A pattern may contain commas; it is a single parameter.
        Some((name, pattern)) if matches!(name.trim(), "regex" | "not_regex") => {
            (name.trim(), vec![pattern.trim()])
        }
        Some((name, params)) => (
            name.trim(),
            params.split(',').map(str::trim).filter(|p| !p.is_empty()).collect(),
        ),
        None => (rule.trim(), Vec::new()),
    }
}

/// A rule with its parameters pre-filled for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSuggestion {
    /// Rule name.
    pub rule: String,
    /// Text to insert, e.g. `exists:users,id`.
    pub insert_text: String,
}

/// A problem found in a rule string. These are findings, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleDiagnostic {
    /// The rule name is not in the catalog.
    UnknownRule {
        /// Name as written.
        name: String,
        /// Near matches, best first.
        suggestions: Vec<String>,
    },
    /// `exists:`/`unique:` names a table no migration defines.
    UnknownTable {
        /// Table as written.
        table: String,
        /// Known tables, best first.
        suggestions: Vec<String>,
    },
    /// The rule is missing required parameters.
    MissingParameter {
        /// Rule name.
        rule: String,
        /// Number of required parameters.
        expected: usize,
        /// Number of parameters given.
        found: usize,
    },
    /// Two rules in the same string exclude each other.
    Conflict {
        /// Earlier rule.
        first: String,
        /// Later rule.
        second: String,
    },
}

impl RuleDiagnostic {
    /// A one-line, human-readable description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::UnknownRule { name, suggestions } if suggestions.is_empty() => {
                format!("unknown validation rule '{name}'")
            }
            Self::UnknownRule { name, suggestions } => {
                format!("unknown validation rule '{name}', did you mean '{}'?", suggestions.join("', '"))
            }
            Self::UnknownTable { table, suggestions } if suggestions.is_empty() => {
                format!("table '{table}' is not defined by any migration")
            }
            Self::UnknownTable { table, suggestions } => format!(
                "table '{table}' is not defined by any migration, did you mean '{}'?",
                suggestions.join("', '")
            ),
            Self::MissingParameter { rule, expected, found } => {
                format!("rule '{rule}' needs {expected} parameter(s), found {found}")
            }
            Self::Conflict { first, second } => format!("rules '{first}' and '{second}' conflict"),
        }
    }
}

/// The static rule catalog.
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    rules: Vec<ValidationRule>,
    by_name: FxHashMap<&'static str, usize>,
    exclusions: FxHashMap<&'static str, &'static [&'static str]>,
    config: ValidationConfig,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Builds the catalog with default similarity settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ValidationConfig::default())
    }

    /// Builds the catalog with the given similarity settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::RuleRegistry;
    ///
    /// let registry = RuleRegistry::new();
    /// let exists = registry.rule("exists").unwrap();
    /// assert_eq!(exists.required_parameters(), 1);
    /// assert_eq!(exists.examples, vec!["exists:users,id"]);
    /// ```
    #[must_use]
    pub fn with_config(config: ValidationConfig) -> Self {
        let rules: Vec<ValidationRule> = CATALOG.iter().map(build_rule).collect();
        let by_name = CATALOG
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name, i))
            .collect();
        let exclusions = EXCLUSIONS.iter().copied().collect();
        Self {
            rules,
            by_name,
            exclusions,
            config,
        }
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&ValidationRule> {
        self.by_name.get(name).and_then(|&i| self.rules.get(i))
    }

    /// Rules whose name starts with `prefix`, in catalog order.
    #[must_use]
    pub fn rules_with_prefix(&self, prefix: &str) -> Vec<&ValidationRule> {
        self.rules.iter().filter(|r| r.name.starts_with(prefix)).collect()
    }

    /// Rules in `category`, in catalog order.
    #[must_use]
    pub fn rules_in(&self, category: RuleCategory) -> Vec<&ValidationRule> {
        self.rules.iter().filter(|r| r.category == category).collect()
    }

    /// Every rule.
    #[must_use]
    pub fn all(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Returns `true` if `a` and `b` exclude each other, in either direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::RuleRegistry;
    ///
    /// let registry = RuleRegistry::new();
    /// assert!(registry.conflicts("required", "nullable"));
    /// assert!(registry.conflicts("nullable", "required"));
    /// assert!(!registry.conflicts("required", "string"));
    /// ```
    #[must_use]
    pub fn conflicts(&self, a: &str, b: &str) -> bool {
        let excludes = |x: &str, y: &str| self.exclusions.get(x).is_some_and(|set| set.contains(&y));
        excludes(a, b) || excludes(b, a)
    }

    /// Catalog rules that can still be added to a field with `applied` rules.
    ///
    /// `applied` entries may carry parameters (`max:255`); only the name is
    /// compared.
    #[must_use]
    pub fn compatible_rules(&self, applied: &[&str]) -> Vec<&ValidationRule> {
        let applied: Vec<&str> = applied.iter().map(|r| parse_rule(r).0).collect();
        self.rules
            .iter()
            .filter(|rule| {
                !applied.contains(&rule.name.as_str())
                    && applied.iter().all(|a| !self.conflicts(a, &rule.name))
            })
            .collect()
    }

    /// Pre-fills `rule`'s parameters for a field named `field`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::RuleRegistry;
    ///
    /// let registry = RuleRegistry::new();
    /// let suggestion = registry.suggest("exists", "category_id").unwrap();
    /// assert_eq!(suggestion.insert_text, "exists:categories,id");
    /// assert_eq!(registry.suggest("min", "password").unwrap().insert_text, "min:8");
    /// ```
    #[must_use]
    pub fn suggest(&self, rule: &str, field: &str) -> Option<RuleSuggestion> {
        let definition = self.rule(rule)?;
        let insert_text = match rule {
            "exists" | "unique" => match field.strip_suffix("_id").filter(|s| !s.is_empty()) {
                Some(stem) => format!("{rule}:{},id", pluralize(stem)),
                None => format!("{rule}:table,column"),
            },
            "min" | "max" | "size" => format!("{rule}:{}", size_default(field)),
            "between" => format!("between:1,{}", size_default(field)),
            _ if definition.takes_parameters() => definition
                .examples
                .first()
                .cloned()
                .unwrap_or_else(|| definition.name.clone()),
            _ => definition.name.clone(),
        };
        Some(RuleSuggestion {
            rule: definition.name.clone(),
            insert_text,
        })
    }

    /// Checks a pipe-separated rule string.
    ///
    /// `tables` are the migration-defined table names; table checks are
    /// skipped when it is empty, and suggestions come only from it.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::{RuleDiagnostic, RuleRegistry};
    ///
    /// let registry = RuleRegistry::new();
    /// let found = registry.diagnose("required|exists:usres,id", &["users", "posts"]);
    /// assert_eq!(
    ///     found,
    ///     vec![RuleDiagnostic::UnknownTable {
    ///         table: "usres".to_owned(),
    ///         suggestions: vec!["users".to_owned()],
    ///     }]
    /// );
    /// ```
    #[must_use]
    pub fn diagnose(&self, rule_string: &str, tables: &[&str]) -> Vec<RuleDiagnostic> {
        let parts: Vec<(&str, Vec<&str>)> =
            split_rule_string(rule_string).into_iter().map(parse_rule).collect();
        let mut diagnostics = Vec::new();

        for (name, params) in &parts {
            let Some(definition) = self.rule(name) else {
                diagnostics.push(RuleDiagnostic::UnknownRule {
                    name: (*name).to_owned(),
                    suggestions: self.similar(name, self.rules.iter().map(|r| r.name.as_str())),
                });
                continue;
            };

            let expected = definition.required_parameters();
            if params.len() < expected {
                diagnostics.push(RuleDiagnostic::MissingParameter {
                    rule: definition.name.clone(),
                    expected,
                    found: params.len(),
                });
            }

            if matches!(*name, "exists" | "unique") && !tables.is_empty() {
                if let Some(table) = params.first().and_then(|t| table_argument(t)) {
                    if !tables.contains(&table) {
                        let mut suggestions = self.similar(table, tables.iter().copied());
                        if suggestions.is_empty() {
                            let mut known: Vec<String> = tables.iter().map(|t| (*t).to_owned()).collect();
                            known.sort_unstable();
                            known.truncate(self.config.max_suggestions);
                            suggestions = known;
                        }
                        diagnostics.push(RuleDiagnostic::UnknownTable {
                            table: table.to_owned(),
                            suggestions,
                        });
                    }
                }
            }
        }

        for (i, (first, _)) in parts.iter().enumerate() {
            for (second, _) in parts.iter().skip(i + 1) {
                if self.conflicts(first, second) {
                    diagnostics.push(RuleDiagnostic::Conflict {
                        first: (*first).to_owned(),
                        second: (*second).to_owned(),
                    });
                }
            }
        }
        diagnostics
    }

    /// Candidates at or above the similarity threshold, best first.
    fn similar<'a>(&self, needle: &str, candidates: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = candidates
            .map(|c| (similarity(needle, c), c))
            .filter(|(score, _)| *score >= self.config.similarity_threshold)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(self.config.max_suggestions)
            .map(|(_, c)| c.to_owned())
            .collect()
    }
}

/// Edit distance over bytes. Rule and table names are ASCII.
fn levenshtein_distance(a: &[u8], b: &[u8]) -> usize {
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, &ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

/// `1 - distance / longer length`, so identical strings score 1.
#[allow(clippy::cast_precision_loss)]
fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a.as_bytes(), b.as_bytes()) as f64 / longest as f64
}

fn build_rule(spec: &RuleSpec) -> ValidationRule {
    let parameters: Vec<ValidationParameter> = spec
        .params
        .iter()
        .map(|p| ValidationParameter {
            name: p.name.to_owned(),
            param_type: p.param_type,
            required: p.required,
            description: p.description.to_owned(),
            examples: vec![p.example.to_owned()],
        })
        .collect();

    let example = if spec.params.is_empty() {
        spec.name.to_owned()
    } else {
        let args: Vec<&str> = spec
            .params
            .iter()
            .take_while(|p| p.required)
            .chain(spec.params.iter().filter(|p| !p.required).take(1))
            .map(|p| p.example)
            .collect();
        format!("{}:{}", spec.name, args.join(","))
    };

    ValidationRule {
        name: spec.name.to_owned(),
        category: spec.category,
        description: spec.description.to_owned(),
        parameters,
        examples: vec![example],
        doc_url: Some(format!("{DOC_BASE}{}", spec.name.replace('_', "-"))),
    }
}

fn size_default(field: &str) -> u32 {
    let field = field.to_ascii_lowercase();
    if field.contains("password") {
        8
    } else if field.contains("name") || field.contains("email") {
        255
    } else {
        100
    }
}

/// The table named by an `exists:`/`unique:` argument, or `None` when the
/// argument is a model class reference.
fn table_argument(arg: &str) -> Option<&str> {
    if arg.contains('\\') {
        return None;
    }
    Some(arg.rsplit('.').next().unwrap_or(arg))
}

/// A diagnosed rule usage found in project source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Declaring file.
    pub file: Utf8PathBuf,
    /// Validated field.
    pub field: String,
    /// Rules as written.
    pub rules: Vec<String>,
    /// Position of the field entry.
    pub location: SourceLocation,
    /// Findings; empty when the rules check out.
    pub diagnostics: Vec<RuleDiagnostic>,
}

/// Every rule usage in the project, with diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ValidationIndex {
    reports: Vec<ValidationReport>,
}

impl ValidationIndex {
    /// Diagnoses extracted usages against the registry and known tables.
    #[must_use]
    pub fn build(
        registry: &RuleRegistry,
        usages: Vec<(Utf8PathBuf, Vec<RuleUsage>)>,
        tables: &[&str],
    ) -> Self {
        let reports = usages
            .into_iter()
            .flat_map(|(file, usages)| {
                usages.into_iter().map(move |usage| {
                    let diagnostics = registry.diagnose(&usage.rule_string(), tables);
                    ValidationReport {
                        file: file.clone(),
                        field: usage.field,
                        rules: usage.rules,
                        location: usage.location,
                        diagnostics,
                    }
                })
            })
            .collect();
        Self { reports }
    }

    /// Re-runs diagnostics over the same usages against a new table list.
    #[must_use]
    pub fn rediagnose(&self, registry: &RuleRegistry, tables: &[&str]) -> Self {
        let reports = self
            .reports
            .iter()
            .map(|report| ValidationReport {
                diagnostics: registry.diagnose(&report.rules.join("|"), tables),
                ..report.clone()
            })
            .collect();
        Self { reports }
    }

    /// Every report.
    #[must_use]
    pub fn all(&self) -> &[ValidationReport] {
        &self.reports
    }

    /// Reports that carry at least one diagnostic.
    #[must_use]
    pub fn with_diagnostics(&self) -> Vec<&ValidationReport> {
        self.reports.iter().filter(|r| !r.diagnostics.is_empty()).collect()
    }

    /// Reports for `file`.
    #[must_use]
    pub fn for_file(&self, file: &Utf8Path) -> Vec<&ValidationReport> {
        self.reports.iter().filter(|r| r.file == file).collect()
    }

    /// Number of rule usages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Returns `true` if no usages were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_unique() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.by_name.len(), registry.all().len());
        for (name, excluded) in EXCLUSIONS {
            assert!(registry.rule(name).is_some(), "{name}");
            for other in *excluded {
                assert!(registry.rule(other).is_some(), "{other}");
            }
        }
    }

    #[test]
    fn test_similarity() {
        assert_eq!(levenshtein_distance(b"strng", b"string"), 1);
        assert_eq!(levenshtein_distance(b"", b"max"), 3);
        assert_eq!(levenshtein_distance(b"kitten", b"sitting"), 3);
        assert!((similarity("same", "same") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("", "") - 1.0).abs() < f64::EPSILON);
        assert!((similarity("emial", "email") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_required_excludes_nullable_both_ways() {
        let registry = RuleRegistry::new();
        let names = |applied: &[&str]| -> Vec<String> {
            registry
                .compatible_rules(applied)
                .into_iter()
                .map(|r| r.name.clone())
                .collect()
        };

        let after_required = names(&["required"]);
        assert!(!after_required.contains(&"nullable".to_owned()));
        assert!(!after_required.contains(&"required".to_owned()));
        assert!(after_required.contains(&"string".to_owned()));

        let after_nullable = names(&["nullable"]);
        assert!(!after_nullable.contains(&"required".to_owned()));
    }

    #[test]
    fn test_type_exclusions_with_parameters() {
        let registry = RuleRegistry::new();
        let names: Vec<_> = registry
            .compatible_rules(&["numeric", "max:10"])
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert!(!names.contains(&"string"));
        assert!(!names.contains(&"boolean"));
        assert!(!names.contains(&"max"));
        assert!(names.contains(&"integer"));
    }

    #[test]
    fn test_suggestions_by_field_name() {
        let registry = RuleRegistry::new();
        let text = |rule: &str, field: &str| registry.suggest(rule, field).map(|s| s.insert_text);

        assert_eq!(text("unique", "user_id").as_deref(), Some("unique:users,id"));
        assert_eq!(text("exists", "email").as_deref(), Some("exists:table,column"));
        assert_eq!(text("max", "email").as_deref(), Some("max:255"));
        assert_eq!(text("max", "first_name").as_deref(), Some("max:255"));
        assert_eq!(text("size", "code").as_deref(), Some("size:100"));
        assert_eq!(text("between", "password").as_deref(), Some("between:1,8"));
        assert_eq!(text("in", "status").as_deref(), Some("in:draft,published"));
        assert_eq!(text("email", "email").as_deref(), Some("email"));
        assert_eq!(text("bogus", "email"), None);
    }

    #[test]
    fn test_unknown_table_suggests_only_known_tables() {
        let registry = RuleRegistry::new();
        let found = registry.diagnose("exists:invoices,id", &["users", "posts"]);
        assert_eq!(found.len(), 1);
        let RuleDiagnostic::UnknownTable { table, suggestions } = &found[0] else {
            unreachable!("expected an unknown table");
        };
        assert_eq!(table, "invoices");
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| s == "users" || s == "posts"));
    }

    #[test]
    fn test_unknown_rule_near_matches() {
        let registry = RuleRegistry::new();
        let found = registry.diagnose("requird|strng", &[]);
        assert_eq!(
            found,
            vec![
                RuleDiagnostic::UnknownRule {
                    name: "requird".to_owned(),
                    suggestions: vec!["required".to_owned()],
                },
                RuleDiagnostic::UnknownRule {
                    name: "strng".to_owned(),
                    suggestions: vec!["string".to_owned()],
                },
            ]
        );
        assert!(found[0].message().contains("did you mean 'required'"));
    }

    #[test]
    fn test_missing_parameter_and_conflict() {
        let registry = RuleRegistry::new();
        let found = registry.diagnose("required|nullable|max", &[]);
        assert_eq!(
            found,
            vec![
                RuleDiagnostic::MissingParameter {
                    rule: "max".to_owned(),
                    expected: 1,
                    found: 0,
                },
                RuleDiagnostic::Conflict {
                    first: "required".to_owned(),
                    second: "nullable".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_regex_patterns_with_pipes_and_commas() {
        let registry = RuleRegistry::new();
        assert!(registry.diagnose("required|regex:/^(a|b),c$/", &[]).is_empty());
        assert!(registry.diagnose("not_regex:/x|y/i|string", &[]).is_empty());
        assert_eq!(parse_rule("regex:/^a,b$/"), ("regex", vec!["/^a,b$/"]));
    }

    #[test]
    fn test_table_checks_skip_model_references_and_connections() {
        let registry = RuleRegistry::new();
        assert!(registry.diagnose("exists:App\\Models\\User,id", &["users"]).is_empty());
        assert!(registry.diagnose("unique:mysql.users,email", &["users"]).is_empty());
        assert!(registry.diagnose("exists:anything", &[]).is_empty());
    }

    #[test]
    fn test_validation_index() {
        let registry = RuleRegistry::new();
        let source = "<?php\nfunction rules() { return ['title' => 'required|max:255', 'author_id' => 'exists:authors,id']; }";
        let usages = cv_extract::validation::extract_rule_usages(source).unwrap();
        let file = Utf8PathBuf::from("app/Http/Requests/StorePost.php");
        let index = ValidationIndex::build(&registry, vec![(file.clone(), usages)], &["users", "posts"]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.for_file(&file).len(), 2);
        let flagged = index.with_diagnostics();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].field, "author_id");

        let index = index.rediagnose(&registry, &["authors"]);
        assert!(index.with_diagnostics().is_empty());
    }
}
