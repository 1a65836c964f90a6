//! Translation catalog entries and usage evidence.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::location::SourceLocation;

/// A single catalog entry for one key in one locale.
///
/// Multiple entries share a key across locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    /// Dotted key, namespaced by catalog file (e.g. `auth.failed`).
    pub key: String,

    /// Locale directory the entry came from.
    pub locale: String,

    /// Translated text.
    pub value: String,

    /// Catalog file.
    pub file: Utf8PathBuf,

    /// Line of the value, when the format carries line information.
    pub line: Option<u32>,

    /// Whether any scanned source references this key.
    pub is_used: bool,
}

/// The call syntax a translation usage was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationForm {
    /// `__('key')`
    Underscore,
    /// `trans('key')`
    Trans,
    /// `trans_choice('key', n)`
    TransChoice,
    /// `Lang::get('key')` or `Lang::choice('key', n)`
    LangFacade,
    /// `@lang('key')` or `@choice('key', n)`
    Directive,
}

impl InvocationForm {
    /// Returns a short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Underscore => "__",
            Self::Trans => "trans",
            Self::TransChoice => "trans_choice",
            Self::LangFacade => "Lang",
            Self::Directive => "directive",
        }
    }
}

/// A reference to a translation key found in project source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranslationUsage {
    /// Referenced key.
    pub key: String,

    /// Referencing file.
    pub file: Utf8PathBuf,

    /// Position of the call.
    pub location: SourceLocation,

    /// Call syntax.
    pub form: InvocationForm,

    /// Whether the call sits inside `{{ }}` or `{!! !!}` interpolation.
    pub in_template: bool,
}
