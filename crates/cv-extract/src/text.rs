//! Small text helpers shared by the extractors.

use convert_case::{Case, Casing};
use cv_core::SourceLocation;

use crate::patterns;

/// Trims whitespace and one pair of matching single or double quotes.
///
/// # Examples
///
/// ```
/// use cv_extract::text::strip_quotes;
///
/// assert_eq!(strip_quotes(" 'users' "), "users");
/// assert_eq!(strip_quotes("\"posts\""), "posts");
/// assert_eq!(strip_quotes("true"), "true");
/// ```
#[must_use]
pub fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Normalizes a class reference to its bare class name.
///
/// Strips quotes, a trailing `::class`, and any namespace path.
///
/// # Examples
///
/// ```
/// use cv_extract::text::normalize_class_ref;
///
/// assert_eq!(normalize_class_ref("\\App\\Models\\User::class"), "User");
/// assert_eq!(normalize_class_ref("'App\\Models\\Post'"), "Post");
/// assert_eq!(normalize_class_ref("Comment"), "Comment");
/// ```
#[must_use]
pub fn normalize_class_ref(text: &str) -> String {
    let bare = strip_quotes(text);
    let bare = bare.strip_suffix("::class").unwrap_or(bare);
    let bare = bare.rsplit('\\').next().unwrap_or(bare);
    bare.trim().to_owned()
}

/// Converts a `StudlyCase` class name to `snake_case`.
///
/// # Examples
///
/// ```
/// use cv_extract::text::snake_case;
///
/// assert_eq!(snake_case("BlogPost"), "blog_post");
/// assert_eq!(snake_case("HTTPRequest"), "http_request");
/// assert_eq!(snake_case("user"), "user");
/// ```
#[must_use]
pub fn snake_case(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Splits a pipe-delimited rule string into trimmed, non-empty rules.
///
/// A `regex:` or `not_regex:` rule runs to its closing pattern delimiter,
/// so alternations inside the pattern stay in one rule.
///
/// # Examples
///
/// ```
/// use cv_extract::text::split_rule_string;
///
/// assert_eq!(split_rule_string("required| max:255 |"), vec!["required", "max:255"]);
/// assert_eq!(
///     split_rule_string("regex:/^(a|b)$/i|string"),
///     vec!["regex:/^(a|b)$/i", "string"],
/// );
/// ```
#[must_use]
pub fn split_rule_string(text: &str) -> Vec<&str> {
    let mut rules = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let segment = rest.trim_start();
        let end = regex_rule_end(segment)
            .or_else(|| segment.find('|'))
            .unwrap_or(segment.len());
        let rule = segment[..end].trim();
        if !rule.is_empty() {
            rules.push(rule);
        }
        rest = segment.get(end + 1..).unwrap_or("");
    }
    rules
}

/// Byte offset where a leading `regex:`/`not_regex:` rule ends: the `|`
/// after its closing delimiter and flags, or the end of `segment`.
fn regex_rule_end(segment: &str) -> Option<usize> {
    let pattern = segment
        .strip_prefix("regex:")
        .or_else(|| segment.strip_prefix("not_regex:"))?;
    let start = segment.len() - pattern.len();
    let delimiter = pattern.chars().next()?;
    if delimiter.is_alphanumeric() || delimiter.is_whitespace() || delimiter == '\\' {
        return None;
    }

    let mut escaped = false;
    for (i, c) in pattern.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            let tail = pattern[i + c.len_utf8()..]
                .trim_start_matches(|f: char| f.is_ascii_alphabetic())
                .trim_start();
            if tail.is_empty() || tail.starts_with('|') {
                return Some(start + pattern.len() - tail.len());
            }
        }
    }
    Some(segment.len())
}

/// Words whose plural does not follow the suffix rules.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
    ("ox", "oxen"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("life", "lives"),
    ("leaf", "leaves"),
];

/// Words that are the same in singular and plural.
const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "news",
    "data",
    "media",
    "feedback",
];

/// Pluralizes an English noun, operating on the last `_` segment.
///
/// # Examples
///
/// ```
/// use cv_extract::text::pluralize;
///
/// assert_eq!(pluralize("user"), "users");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("blog_post"), "blog_posts");
/// assert_eq!(pluralize("address"), "addresses");
/// assert_eq!(pluralize("person"), "people");
/// ```
#[must_use]
pub fn pluralize(word: &str) -> String {
    let (head, last) = match word.rfind('_') {
        Some(pos) => word.split_at(pos + 1),
        None => ("", word),
    };
    format!("{head}{}", pluralize_word(last))
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_owned();
    }
    if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(single, _)| *single == lower) {
        return (*plural).to_owned();
    }

    if let Some(stem) = word.strip_suffix('y') {
        let vowel_before = stem
            .chars()
            .last()
            .is_some_and(|c| "aeiouAEIOU".contains(c));
        if !vowel_before {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

/// Derives a model's conventional table name from its class name.
///
/// # Examples
///
/// ```
/// use cv_extract::text::table_name_for;
///
/// assert_eq!(table_name_for("User"), "users");
/// assert_eq!(table_name_for("OrderItem"), "order_items");
/// ```
#[must_use]
pub fn table_name_for(class: &str) -> String {
    pluralize(&snake_case(class))
}

/// Returns `true` for lines that are entirely a comment.
#[must_use]
pub fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
}

/// Collects every quoted string inside `text`, in order.
///
/// # Examples
///
/// ```
/// use cv_extract::text::quoted_strings;
///
/// assert_eq!(quoted_strings("['auth', \"verified\"]"), vec!["auth", "verified"]);
/// ```
#[must_use]
pub fn quoted_strings(text: &str) -> Vec<String> {
    patterns::QUOTED_STRING
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Maps byte offsets to line/column positions.
///
/// Built once per file so each lookup is a binary search instead of a rescan.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Indexes the line starts of `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    /// Returns the location of `offset`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_extract::text::LineIndex;
    /// use cv_core::SourceLocation;
    ///
    /// let index = LineIndex::new("one\ntwo\nthree");
    /// assert_eq!(index.location(5), SourceLocation::new(2, 1));
    /// ```
    #[must_use]
    pub fn location(&self, offset: usize) -> SourceLocation {
        let line = self.starts.partition_point(|&start| start <= offset).max(1);
        let start = self.starts.get(line - 1).copied().unwrap_or(0);
        SourceLocation::new(
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(offset.saturating_sub(start)).unwrap_or(u32::MAX),
        )
    }

    /// Returns the 1-indexed line of `offset`.
    #[must_use]
    pub fn line(&self, offset: usize) -> u32 {
        self.location(offset).line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes_mismatched() {
        assert_eq!(strip_quotes("'users\""), "'users\"");
        assert_eq!(strip_quotes("'"), "'");
        assert_eq!(strip_quotes("''"), "");
    }

    #[test]
    fn test_normalize_class_ref_variants() {
        assert_eq!(normalize_class_ref("User::class"), "User");
        assert_eq!(normalize_class_ref("App\\Models\\User::class"), "User");
        assert_eq!(normalize_class_ref(" \"Tag\" "), "Tag");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("OrderItem"), "order_item");
        assert_eq!(snake_case("APIToken"), "api_token");
    }

    #[test]
    fn test_split_rule_string_keeps_regex_patterns_whole() {
        assert_eq!(
            split_rule_string("required|regex:/^(a|b),c$/|max:10"),
            vec!["required", "regex:/^(a|b),c$/", "max:10"]
        );
        assert_eq!(split_rule_string("not_regex:#a\\#|b#u | string"), vec!["not_regex:#a\\#|b#u", "string"]);
        // No closing delimiter: the pattern swallows the rest.
        assert_eq!(split_rule_string("nullable|regex:/a|b"), vec!["nullable", "regex:/a|b"]);
        assert!(split_rule_string(" | ").is_empty());
    }

    #[test]
    fn test_pluralize_suffix_rules() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("leaf"), "leaves");
        assert_eq!(pluralize("profile"), "profiles");
    }

    #[test]
    fn test_pluralize_irregular_and_uncountable() {
        assert_eq!(pluralize("child"), "children");
        assert_eq!(pluralize("media"), "media");
        assert_eq!(pluralize("order_person"), "order_people");
    }

    #[test]
    fn test_table_name_for() {
        assert_eq!(table_name_for("Category"), "categories");
        assert_eq!(table_name_for("BlogPost"), "blog_posts");
    }

    #[test]
    fn test_is_comment_line() {
        assert!(is_comment_line("  // Route::get('/old', ...)"));
        assert!(is_comment_line(" * @return void"));
        assert!(!is_comment_line("Route::get('/', fn () => 1);"));
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("a\nbc\n\nd");
        assert_eq!(index.location(0), SourceLocation::new(1, 0));
        assert_eq!(index.location(3), SourceLocation::new(2, 1));
        assert_eq!(index.location(5), SourceLocation::new(3, 0));
        assert_eq!(index.location(6), SourceLocation::new(4, 0));
        assert_eq!(index.line(6), 4);
    }

    #[test]
    fn test_line_index_matches_from_offset() {
        let text = "first\nsecond\nthird line";
        let index = LineIndex::new(text);
        for offset in [0, 4, 6, 12, 15, text.len()] {
            assert_eq!(index.location(offset), SourceLocation::from_offset(text, offset));
        }
    }
}
