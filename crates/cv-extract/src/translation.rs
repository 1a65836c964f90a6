//! Translation catalogs and usage scanning.
//!
//! Catalog files come in two shapes:
//!
//! - `<locale>/<file>.php` returning a nested array; keys are namespaced by
//!   the file (`auth.failed`)
//! - `<locale>.json` or `<locale>/*.json` objects, flattened by dot-joining
//!   nested keys
//!
//! Usages are found by [`scan_usages`] in any source or template file.

use camino::Utf8Path;
use cv_core::{InvocationForm, TranslationUsage};

use crate::error::ExtractError;
use crate::patterns;
use crate::php_array::{flatten, parse_return_array};
use crate::text::LineIndex;

/// One string leaf of a catalog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogLeaf {
    /// Fully qualified key.
    pub key: String,
    /// Translated text.
    pub value: String,
    /// Line of the entry, when the format carries one.
    pub line: Option<u32>,
}

/// Extracts the string leaves of a PHP catalog, prefixing keys with `namespace.`.
///
/// Non-string leaves (numbers, expressions) are not translations and are
/// skipped.
///
/// # Examples
///
/// ```
/// use cv_extract::translation::extract_php_catalog;
///
/// let source = "<?php\nreturn [\n    'welcome' => 'Welcome!',\n    'nav' => ['home' => 'Home'],\n];";
/// let leaves = extract_php_catalog(source, "messages")?;
///
/// assert_eq!(leaves[0].key, "messages.welcome");
/// assert_eq!(leaves[1].key, "messages.nav.home");
/// assert_eq!(leaves[1].line, Some(4));
/// # Ok::<(), cv_extract::ExtractError>(())
/// ```
pub fn extract_php_catalog(content: &str, namespace: &str) -> Result<Vec<CatalogLeaf>, ExtractError> {
    let items = parse_return_array(content)?;
    let lines = LineIndex::new(content);
    Ok(flatten(&items)
        .into_iter()
        .filter_map(|entry| {
            let value = entry.value?;
            Some(CatalogLeaf {
                key: format!("{namespace}.{}", entry.key),
                value,
                line: Some(lines.line(entry.offset)),
            })
        })
        .collect())
}

/// Extracts the string leaves of a JSON catalog.
///
/// Nested objects are flattened by dot-joining their keys; `prefix` is
/// prepended verbatim to every key.
///
/// # Examples
///
/// ```
/// use cv_extract::translation::extract_json_catalog;
///
/// let leaves = extract_json_catalog(r#"{"Log in": "Connexion", "nav": {"home": "Accueil"}}"#, "")?;
/// assert_eq!(leaves[0].key, "Log in");
/// assert_eq!(leaves[1].key, "nav.home");
/// # Ok::<(), cv_extract::ExtractError>(())
/// ```
pub fn extract_json_catalog(content: &str, prefix: &str) -> Result<Vec<CatalogLeaf>, ExtractError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let object = value.as_object().ok_or(ExtractError::NotAnObject)?;
    let mut leaves = Vec::new();
    flatten_json(object, prefix, &mut leaves);
    Ok(leaves)
}

fn flatten_json(
    object: &serde_json::Map<String, serde_json::Value>,
    prefix: &str,
    out: &mut Vec<CatalogLeaf>,
) {
    for (key, value) in object {
        let path = if prefix.is_empty() || prefix.ends_with("::") {
            format!("{prefix}{key}")
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            serde_json::Value::String(text) => out.push(CatalogLeaf {
                key: path,
                value: text.clone(),
                line: None,
            }),
            serde_json::Value::Object(nested) => flatten_json(nested, &path, out),
            _ => {}
        }
    }
}

/// Finds every translation call in a source or template file.
///
/// Keys must be string literals; double-quoted keys containing `$`
/// interpolation are skipped.
///
/// # Examples
///
/// ```
/// use cv_extract::translation::scan_usages;
/// use cv_core::InvocationForm;
/// use camino::Utf8Path;
///
/// let source = "<h1>{{ __('messages.welcome') }}</h1>\n@lang('auth.failed')";
/// let usages = scan_usages(source, Utf8Path::new("resources/views/home.blade.php"));
///
/// assert_eq!(usages[0].key, "messages.welcome");
/// assert!(usages[0].in_template);
/// assert_eq!(usages[1].form, InvocationForm::Directive);
/// assert!(!usages[1].in_template);
/// ```
#[must_use]
pub fn scan_usages(content: &str, file: &Utf8Path) -> Vec<TranslationUsage> {
    let templates: Vec<_> = patterns::INTERPOLATION
        .find_iter(content)
        .map(|m| m.range())
        .collect();
    let lines = LineIndex::new(content);

    patterns::TRANSLATION_CALL
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(4).or_else(|| caps.get(5))?.as_str();
            if key.is_empty() {
                return None;
            }
            let form = if caps.get(1).is_some() {
                InvocationForm::Directive
            } else if caps.get(3).is_some() {
                InvocationForm::LangFacade
            } else {
                match caps.get(2)?.as_str() {
                    "__" => InvocationForm::Underscore,
                    "trans_choice" => InvocationForm::TransChoice,
                    _ => InvocationForm::Trans,
                }
            };
            let offset = whole.start();
            Some(TranslationUsage {
                key: key.to_owned(),
                file: file.to_owned(),
                location: lines.location(offset),
                form,
                in_template: templates.iter().any(|span| span.contains(&offset)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::SourceLocation;

    #[test]
    fn test_php_catalog_skips_non_string_leaves() {
        let source = "<?php return ['a' => 'A', 'n' => 5, 'e' => __('x'), 'list' => ['one', 'two']];";
        let keys: Vec<_> = extract_php_catalog(source, "m")
            .unwrap()
            .into_iter()
            .map(|l| l.key)
            .collect();
        assert_eq!(keys, vec!["m.a", "m.list.0", "m.list.1"]);
    }

    #[test]
    fn test_php_catalog_nested_namespace() {
        let source = "<?php return ['reset' => 'Your password has been reset.'];";
        let leaves = extract_php_catalog(source, "auth/passwords").unwrap();
        assert_eq!(leaves[0].key, "auth/passwords.reset");
        assert_eq!(leaves[0].value, "Your password has been reset.");
    }

    #[test]
    fn test_php_catalog_malformed() {
        assert!(extract_php_catalog("<?php return ['a' => 'b'", "m").is_err());
        assert!(matches!(
            extract_php_catalog("<?php // empty", "m"),
            Err(ExtractError::MissingReturn)
        ));
    }

    #[test]
    fn test_json_catalog_errors() {
        assert!(matches!(
            extract_json_catalog("[1, 2]", ""),
            Err(ExtractError::NotAnObject)
        ));
        assert!(matches!(
            extract_json_catalog("{\"a\": ", ""),
            Err(ExtractError::Json(_))
        ));
    }

    #[test]
    fn test_json_catalog_vendor_prefix() {
        let leaves = extract_json_catalog(r#"{"greeting": "Hi", "count": 3}"#, "courier::").unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].key, "courier::greeting");
        assert_eq!(leaves[0].line, None);
    }

    #[test]
    fn test_scan_usage_forms() {
        let source = "<?php\n$a = __('a.one');\n$b = trans(\"b.two\");\n$c = trans_choice('c.three', 2);\n$d = Lang::get('d.four');\n$e = Lang::choice('e.five', 1);\n";
        let usages = scan_usages(source, Utf8Path::new("app/Http/Controllers/X.php"));
        let forms: Vec<_> = usages.iter().map(|u| (u.key.as_str(), u.form)).collect();
        assert_eq!(
            forms,
            vec![
                ("a.one", InvocationForm::Underscore),
                ("b.two", InvocationForm::Trans),
                ("c.three", InvocationForm::TransChoice),
                ("d.four", InvocationForm::LangFacade),
                ("e.five", InvocationForm::LangFacade),
            ]
        );
        assert_eq!(usages[0].location, SourceLocation::new(2, 5));
        assert!(usages.iter().all(|u| !u.in_template));
    }

    #[test]
    fn test_scan_usage_templates() {
        let source = "{!! __('raw.html') !!}\n{{ trans_choice('apples', 3) }}\n@choice('pears', 2)";
        let usages = scan_usages(source, Utf8Path::new("resources/views/a.blade.php"));
        assert_eq!(usages.len(), 3);
        assert!(usages[0].in_template);
        assert!(usages[1].in_template);
        assert_eq!(usages[2].form, InvocationForm::Directive);
        assert!(!usages[2].in_template);
    }

    #[test]
    fn test_scan_ignores_dynamic_keys() {
        let source = "__($key); __(\"status.$state\"); __('');";
        assert!(scan_usages(source, Utf8Path::new("a.php")).is_empty());
    }
}
