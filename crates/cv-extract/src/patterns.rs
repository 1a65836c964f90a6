//! Compiled patterns shared by the extractors.
//!
//! Every pattern is a literal checked by the tests below, so compilation
//! cannot fail at runtime.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern literal is valid")
}

// -----------------------------------------------------------------------------
// Routes
// -----------------------------------------------------------------------------

pub static ROUTE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"Route::(?:[^;]*?->)?(get|post|put|patch|delete|options|any|match|resource|apiResource)\s*\(",
    )
});

pub static LEADING_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"^\s*(?:'([^']*)'|"([^"]*)")"#));

pub static LEADING_LIST: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*\[([^\]]*)\]\s*,"));

pub static ACTION_AT: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"['"]\\?([\w\\]+)@(\w+)['"]"#));

pub static ACTION_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"\[\s*\\?([\w\\]+)::class\s*,\s*['"](\w+)['"]\s*\]"#)
});

pub static ARG_CLASS_REF: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*,\s*\\?([\w\\]+)::class"));

pub static ARG_QUOTED_CLASS: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"^\s*,\s*['"]\\?([\w\\]+)['"]"#));

pub static CLOSURE: LazyLock<Regex> = LazyLock::new(|| compile(r"\b(?:function|fn)\s*\("));

pub static GROUP_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"\bgroup\s*\("));

pub static NAME_CALL: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?:->|::)name\(\s*['"]([^'"]*)['"]"#));

pub static AS_KEY: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"['"]as['"]\s*=>\s*['"]([^'"]*)['"]"#));

pub static MIDDLEWARE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?:->|::)middleware\(\s*(\[[^\]]*\]|'[^']*'|"[^"]*")"#)
});

pub static MIDDLEWARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"['"]middleware['"]\s*=>\s*(\[[^\]]*\]|'[^']*'|"[^"]*")"#)
});

pub static PREFIX_CALL: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?:->|::)prefix\(\s*['"]([^'"]*)['"]"#));

pub static PREFIX_KEY: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"['"]prefix['"]\s*=>\s*['"]([^'"]*)['"]"#));

pub static QUOTED_STRING: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"'([^']*)'|"([^"]*)""#));

// -----------------------------------------------------------------------------
// Migrations
// -----------------------------------------------------------------------------

pub static UP_METHOD: LazyLock<Regex> = LazyLock::new(|| compile(r"function\s+up\s*\("));

pub static DOWN_METHOD: LazyLock<Regex> = LazyLock::new(|| compile(r"function\s+down\s*\("));

pub static SCHEMA_CALL: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"Schema::(?:connection\([^)]*\)\s*->\s*)?(create|table|drop|dropIfExists|rename)\s*\(\s*['"](\w+)['"](?:\s*,\s*['"](\w+)['"])?"#,
    )
});

pub static BLUEPRINT_CALL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\$(\w+)\s*->\s*\w+\s*\("));

// -----------------------------------------------------------------------------
// Models
// -----------------------------------------------------------------------------

pub static CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?m)^[ \t]*(abstract\s+|final\s+)?class\s+(\w+)(?:\s+extends\s+\\?([\w\\]+))?")
});

pub static HAS_FACTORY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\buse\s+[^;]*\bHasFactory\b"));

pub static TABLE_PROP: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"\$table\s*=\s*['"]([^'"]+)['"]"#));

pub static ARRAY_PROP: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\$(fillable|hidden|casts)\s*=\s*"));

pub static CASTS_METHOD: LazyLock<Regex> =
    LazyLock::new(|| compile(r"function\s+casts\s*\([^)]*\)[^{]*\{\s*return\s*"));

pub static METHOD_DECL: LazyLock<Regex> = LazyLock::new(|| compile(r"function\s+(\w+)\s*\("));

pub static RELATION_CALL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\$this\s*->\s*(\w+)\s*\(\s*([^,)]*)"));

// -----------------------------------------------------------------------------
// Translations
// -----------------------------------------------------------------------------

pub static TRANSLATION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"(?:@(lang|choice)|\b(trans_choice|trans|__)|\bLang::(get|choice))\s*\(\s*(?:'([^'\\]*)'|"([^"\\$]*)")"#,
    )
});

pub static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?s)\{\{.*?\}\}|\{!!.*?!!\}"));

// -----------------------------------------------------------------------------
// Config and environment
// -----------------------------------------------------------------------------

pub static ENV_CALL: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"\benv\s*\(\s*['"](\w+)['"](?:\s*,\s*('[^']*'|"[^"]*"|-?[\w.]+)\s*\))?"#)
});

// -----------------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------------

pub static RULES_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"function\s+rules\s*\([^)]*\)[^{]*\{\s*return\s*|(?:->|::)validate\s*\(\s*(?:\$\w+\s*,\s*)?|Validator::make\s*\(\s*[^,]+,\s*",
    )
});
