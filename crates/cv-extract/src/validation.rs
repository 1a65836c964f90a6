//! Validation rule usages in form requests and controllers.
//!
//! Three anchors introduce a rules array: a `rules()` method returning one,
//! `->validate([...])` / `$this->validate($request, [...])`, and
//! `Validator::make($data, [...])`.

use cv_core::SourceLocation;

use crate::error::ExtractError;
use crate::patterns;
use crate::php_array::{PhpValue, parse_array_at};
use crate::text::{LineIndex, split_rule_string};

/// The rules applied to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleUsage {
    /// Field name, possibly dotted (`items.*.sku`).
    pub field: String,
    /// Rule strings in order, e.g. `["required", "max:255"]`.
    pub rules: Vec<String>,
    /// Position of the field entry.
    pub location: SourceLocation,
}

impl RuleUsage {
    /// Re-joins the rules into pipe form.
    #[must_use]
    pub fn rule_string(&self) -> String {
        self.rules.join("|")
    }
}

/// Finds every `'field' => rules` entry inside a rules array.
///
/// Pipe strings are split; list values keep their string elements and skip
/// rule objects such as `Rule::unique(...)`.
///
/// # Examples
///
/// ```
/// use cv_extract::validation::extract_rule_usages;
///
/// let source = r#"<?php
/// public function rules(): array
/// {
///     return [
///         'title' => 'required|string|max:255',
///         'tags' => ['array', Rule::in($tags)],
///     ];
/// }
/// "#;
///
/// let usages = extract_rule_usages(source)?;
/// assert_eq!(usages[0].rules, vec!["required", "string", "max:255"]);
/// assert_eq!(usages[1].rules, vec!["array"]);
/// # Ok::<(), cv_extract::ExtractError>(())
/// ```
pub fn extract_rule_usages(content: &str) -> Result<Vec<RuleUsage>, ExtractError> {
    let lines = LineIndex::new(content);
    let mut usages = Vec::new();

    for anchor in patterns::RULES_ANCHOR.find_iter(content) {
        let rest = content[anchor.end()..].trim_start();
        if !(rest.starts_with('[') || rest.starts_with("array(")) {
            continue;
        }
        for item in parse_array_at(content, anchor.end())? {
            let Some(field) = item.key else {
                continue;
            };
            let rules: Vec<String> = match &item.value {
                PhpValue::Str(text) => split_rules(text),
                PhpValue::Array(elements) => elements
                    .iter()
                    .filter_map(|element| element.value.as_str())
                    .map(str::trim)
                    .filter(|rule| !rule.is_empty())
                    .map(str::to_owned)
                    .collect(),
                PhpValue::Expr(_) => continue,
            };
            if rules.is_empty() {
                continue;
            }
            usages.push(RuleUsage {
                field,
                rules,
                location: lines.location(item.offset),
            });
        }
    }
    Ok(usages)
}

fn split_rules(text: &str) -> Vec<String> {
    split_rule_string(text).into_iter().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_validate_call() {
        let source = "<?php\nclass PostController {\n  public function store(Request $request) {\n    $data = $request->validate([\n      'title' => 'required|max:255',\n      'user_id' => 'exists:users,id',\n    ]);\n  }\n}";
        let usages = extract_rule_usages(source).unwrap();
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[1].field, "user_id");
        assert_eq!(usages[1].rules, vec!["exists:users,id"]);
        assert_eq!(usages[0].location.line, 5);
    }

    #[test]
    fn test_validator_make_and_legacy_validate() {
        let source = "<?php\n$v = Validator::make($request->all(), ['email' => 'required|email']);\n$this->validate($request, ['name' => ['required', 'string']]);";
        let usages = extract_rule_usages(source).unwrap();
        let fields: Vec<_> = usages.iter().map(|u| u.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "name"]);
        assert_eq!(usages[1].rule_string(), "required|string");
    }

    #[test]
    fn test_regex_rule_with_pipes_stays_whole() {
        let source = "<?php\n$request->validate([\n  'code' => 'required|regex:/^(a|b),c$/',\n  'tag' => ['string', 'not_regex:/x|y/'],\n]);";
        let usages = extract_rule_usages(source).unwrap();
        assert_eq!(usages[0].rules, vec!["required", "regex:/^(a|b),c$/"]);
        assert_eq!(usages[1].rules, vec!["string", "not_regex:/x|y/"]);
    }

    #[test]
    fn test_non_literal_rules_skipped() {
        let source = "<?php\n$request->validate($this->rules);\nfunction rules() { return self::RULES; }";
        assert!(extract_rule_usages(source).unwrap().is_empty());
    }

    #[test]
    fn test_dynamic_values_skipped() {
        let source = "<?php\nfunction rules() { return ['slug' => $this->slugRules(), 'body' => '']; }";
        assert!(extract_rule_usages(source).unwrap().is_empty());
    }
}
