//! Configuration arrays and environment declarations.

use cv_core::FxHashSet;

use crate::error::ExtractError;
use crate::patterns;
use crate::php_array::{flatten, parse_return_array};
use crate::text::{LineIndex, strip_quotes};

/// A node of a configuration array, intermediate or leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigNode {
    /// Dotted key, prefixed with the file stem.
    pub key: String,
    /// String value of a literal leaf.
    pub value: Option<String>,
    /// 1-indexed line of the node.
    pub line: u32,
}

/// An `env('KEY', default)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvReference {
    /// Variable name.
    pub key: String,
    /// Literal default, quotes stripped.
    pub default: Option<String>,
    /// 1-indexed line of the call.
    pub line: u32,
}

/// A `KEY=value` line of an environment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLine {
    /// Variable name.
    pub key: String,
    /// Value with surrounding quotes removed; may be empty.
    pub value: String,
    /// 1-indexed line.
    pub line: u32,
}

/// Extracts every node path of a configuration file.
///
/// # Examples
///
/// ```
/// use cv_extract::config_keys::extract_config_keys;
///
/// let source = "<?php\nreturn [\n    'name' => env('APP_NAME', 'Laravel'),\n    'debug' => false,\n    'locale' => 'en',\n];";
/// let nodes = extract_config_keys(source, "app")?;
///
/// let keys: Vec<_> = nodes.iter().map(|n| n.key.as_str()).collect();
/// assert_eq!(keys, vec!["app.name", "app.debug", "app.locale"]);
/// assert_eq!(nodes[2].value.as_deref(), Some("en"));
/// # Ok::<(), cv_extract::ExtractError>(())
/// ```
pub fn extract_config_keys(content: &str, file_stem: &str) -> Result<Vec<ConfigNode>, ExtractError> {
    let items = parse_return_array(content)?;
    let lines = LineIndex::new(content);
    Ok(flatten(&items)
        .into_iter()
        .map(|entry| ConfigNode {
            key: format!("{file_stem}.{}", entry.key),
            value: entry.value,
            line: lines.line(entry.offset),
        })
        .collect())
}

/// Finds `env()` references, first occurrence of each key only.
#[must_use]
pub fn env_references(content: &str) -> Vec<EnvReference> {
    let lines = LineIndex::new(content);
    let mut seen = FxHashSet::default();
    patterns::ENV_CALL
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?.as_str();
            if !seen.insert(key.to_owned()) {
                return None;
            }
            Some(EnvReference {
                key: key.to_owned(),
                default: caps.get(2).map(|d| strip_quotes(d.as_str()).to_owned()),
                line: lines.line(whole.start()),
            })
        })
        .collect()
}

/// Parses the declarations of a `.env` file.
///
/// Blank lines and `#` comments are skipped, a leading `export ` is
/// tolerated, and one layer of matching quotes is stripped from the value.
/// Unquoted values lose trailing ` # comments`.
///
/// # Examples
///
/// ```
/// use cv_extract::config_keys::parse_env_file;
///
/// let lines = parse_env_file("# app\nAPP_NAME=\"My App\"\nexport APP_ENV=local\n");
/// assert_eq!(lines[0].key, "APP_NAME");
/// assert_eq!(lines[0].value, "My App");
/// assert_eq!(lines[1].line, 3);
/// ```
#[must_use]
pub fn parse_env_file(content: &str) -> Vec<EnvLine> {
    content
        .lines()
        .zip(1_u32..)
        .filter_map(|(raw, line)| {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                return None;
            }
            let text = text.strip_prefix("export ").unwrap_or(text);
            let (key, value) = text.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }
            Some(EnvLine {
                key: key.to_owned(),
                value: env_value(value.trim()),
                line,
            })
        })
        .collect()
}

fn env_value(raw: &str) -> String {
    let quoted = raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')));
    if quoted {
        return strip_quotes(raw).to_owned();
    }
    match raw.find(" #") {
        Some(comment) => raw[..comment].trim_end().to_owned(),
        None => raw.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = r"<?php

return [
    'default' => env('DB_CONNECTION', 'sqlite'),

    'connections' => [
        'mysql' => [
            'driver' => 'mysql',
            'port' => env('DB_PORT', 3306),
            'host' => env('DB_HOST'),
        ],
    ],
];
";

    #[test]
    fn test_config_nodes_include_intermediates() {
        let nodes = extract_config_keys(DATABASE, "database").unwrap();
        let keys: Vec<_> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "database.default",
                "database.connections",
                "database.connections.mysql",
                "database.connections.mysql.driver",
                "database.connections.mysql.port",
                "database.connections.mysql.host",
            ]
        );
        assert_eq!(nodes[3].value.as_deref(), Some("mysql"));
        assert_eq!(nodes[3].line, 8);
        assert_eq!(nodes[1].value, None);
    }

    #[test]
    fn test_env_references() {
        let refs = env_references(DATABASE);
        let found: Vec<_> = refs
            .iter()
            .map(|r| (r.key.as_str(), r.default.as_deref()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("DB_CONNECTION", Some("sqlite")),
                ("DB_PORT", Some("3306")),
                ("DB_HOST", None),
            ]
        );
        assert_eq!(refs[0].line, 4);
    }

    #[test]
    fn test_env_references_deduplicated() {
        let refs = env_references("env('A'); env('A', 'x'); env('B');");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].default, None);
    }

    #[test]
    fn test_env_file_edge_cases() {
        let source = "\n# comment\nEMPTY=\nQUOTED='single # kept'\nTRAILING=value # note\nnot a declaration\n=novalue\n";
        let lines = parse_env_file(source);
        let pairs: Vec<_> = lines
            .iter()
            .map(|l| (l.key.as_str(), l.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("EMPTY", ""), ("QUOTED", "single # kept"), ("TRAILING", "value")]
        );
    }

    #[test]
    fn test_malformed_config_is_error() {
        assert!(extract_config_keys("<?php return ['a' => [", "app").is_err());
    }
}
