//! The unit of invalidation.

use serde::{Deserialize, Serialize};

/// One independently rebuilt portion of the index.
///
/// A file change triggers a full re-extraction of every domain whose
/// watched patterns match it.
///
/// # Examples
///
/// ```
/// use cv_core::Domain;
///
/// assert_eq!(Domain::ALL.len(), 6);
/// assert_eq!(Domain::Schema.label(), "schema");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Route declarations and the controller index.
    Routes,
    /// Migrations merged into models.
    Schema,
    /// Translation catalogs.
    Translations,
    /// Translation usages found in source.
    TranslationUsages,
    /// Validation rule usages found in source.
    Validation,
    /// Configuration and environment keys.
    Config,
}

impl Domain {
    /// Every domain, in rebuild order.
    ///
    /// Validation follows Schema because its diagnostics read the table list.
    pub const ALL: [Self; 6] = [
        Self::Routes,
        Self::Schema,
        Self::Translations,
        Self::TranslationUsages,
        Self::Validation,
        Self::Config,
    ];

    /// Returns the snake case label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Routes => "routes",
            Self::Schema => "schema",
            Self::Translations => "translations",
            Self::TranslationUsages => "translation_usages",
            Self::Validation => "validation",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
