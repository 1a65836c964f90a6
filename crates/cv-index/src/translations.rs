//! Translation catalog, usage table, and their reconciliation.
//!
//! The catalog and the usage table are built by separate domains and
//! published independently. [`TranslationIndex`] pairs the latest of each
//! and derives the usage flags, so neither rebuild has to know about the
//! other.

use std::sync::Arc;

use camino::Utf8Path;
use cv_core::{FxHashMap, FxHashSet, TranslationEntry, TranslationUsage};
use serde::Serialize;
use smallvec::SmallVec;

/// How a catalog file contributes keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogFormat {
    /// A PHP file returning a nested array; keys are `<namespace>.<path>`.
    Php {
        /// File-derived namespace (`auth`, `auth/passwords`, `pkg::auth`).
        namespace: String,
    },
    /// A JSON object; keys are used as written, after `prefix`.
    Json {
        /// Empty, or `pkg::` for vendor catalogs.
        prefix: String,
    },
}

/// Where a catalog file sits inside a translation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSource {
    /// Locale the file's entries belong to.
    pub locale: String,
    /// How to read the file.
    pub format: CatalogFormat,
}

impl CatalogSource {
    /// Classifies `path` relative to the translation root `root`.
    ///
    /// Recognized layouts:
    ///
    /// | Path | Locale | Keys |
    /// |------|--------|------|
    /// | `en/auth.php` | `en` | `auth.*` |
    /// | `en/auth/passwords.php` | `en` | `auth/passwords.*` |
    /// | `en.json`, `en/extra.json` | `en` | as written |
    /// | `vendor/pkg/en/mail.php` | `en` | `pkg::mail.*` |
    /// | `vendor/pkg/en.json` | `en` | `pkg::*` |
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_index::translations::{CatalogFormat, CatalogSource};
    /// use camino::Utf8Path;
    ///
    /// let source = CatalogSource::classify(Utf8Path::new("/p/lang"), Utf8Path::new("/p/lang/fr/auth.php")).unwrap();
    /// assert_eq!(source.locale, "fr");
    /// assert_eq!(source.format, CatalogFormat::Php { namespace: "auth".to_owned() });
    /// ```
    #[must_use]
    pub fn classify(root: &Utf8Path, path: &Utf8Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let parts: Vec<&str> = relative.iter().collect();

        let (package, parts) = match parts.as_slice() {
            ["vendor", package, rest @ ..] => (Some(*package), rest),
            _ => (None, parts.as_slice()),
        };
        let package_prefix = package.map(|p| format!("{p}::")).unwrap_or_default();

        match parts {
            [file] => {
                let locale = file.strip_suffix(".json")?;
                Some(Self {
                    locale: locale.to_owned(),
                    format: CatalogFormat::Json {
                        prefix: package_prefix,
                    },
                })
            }
            [locale, rest @ ..] if !rest.is_empty() => {
                let joined = rest.join("/");
                let format = if let Some(stem) = joined.strip_suffix(".php") {
                    CatalogFormat::Php {
                        namespace: format!("{package_prefix}{stem}"),
                    }
                } else if joined.ends_with(".json") {
                    CatalogFormat::Json {
                        prefix: package_prefix,
                    }
                } else {
                    return None;
                };
                Some(Self {
                    locale: (*locale).to_owned(),
                    format,
                })
            }
            _ => None,
        }
    }
}

/// Every catalog entry, with `is_used` unset.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<TranslationEntry>,
    by_key: FxHashMap<String, SmallVec<[usize; 4]>>,
    locales: Vec<String>,
}

impl Catalog {
    /// Indexes catalog entries.
    #[must_use]
    pub fn from_entries(entries: Vec<TranslationEntry>) -> Self {
        let mut by_key: FxHashMap<String, SmallVec<[usize; 4]>> = FxHashMap::default();
        let mut locales = FxHashSet::default();
        for (index, entry) in entries.iter().enumerate() {
            by_key.entry(entry.key.clone()).or_default().push(index);
            locales.insert(entry.locale.clone());
        }
        let mut locales: Vec<String> = locales.into_iter().collect();
        locales.sort_unstable();
        Self {
            entries,
            by_key,
            locales,
        }
    }

    /// Number of entries across all locales.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if any locale defines `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }
}

/// Every translation usage found in project sources.
#[derive(Debug, Clone, Default)]
pub struct UsageTable {
    usages: Vec<TranslationUsage>,
    by_key: FxHashMap<String, Vec<usize>>,
}

impl UsageTable {
    /// Indexes usages by key.
    #[must_use]
    pub fn from_usages(usages: Vec<TranslationUsage>) -> Self {
        let mut by_key: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (index, usage) in usages.iter().enumerate() {
            by_key.entry(usage.key.clone()).or_default().push(index);
        }
        Self { usages, by_key }
    }

    /// Number of usages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.usages.len()
    }

    /// Returns `true` if no usages were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }

    /// Returns `true` if any source references `key`.
    #[must_use]
    pub fn references(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }
}

/// A key used in source but defined in no locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTranslation {
    /// The referenced key.
    pub key: String,
    /// Every place the key is used.
    pub usages: Vec<TranslationUsage>,
}

/// A key defined in some observed locales but not all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteTranslation {
    /// The key.
    pub key: String,
    /// Observed locales lacking the key, sorted.
    pub missing_locales: Vec<String>,
}

/// A catalog reconciled with a usage table.
#[derive(Debug, Clone, Default)]
pub struct TranslationIndex {
    catalog: Arc<Catalog>,
    usages: Arc<UsageTable>,
    entries: Vec<TranslationEntry>,
}

impl TranslationIndex {
    /// Pairs a catalog with a usage table, flagging every entry whose key is
    /// referenced anywhere, in every locale at once.
    #[must_use]
    pub fn reconcile(catalog: Arc<Catalog>, usages: Arc<UsageTable>) -> Self {
        let entries = catalog
            .entries
            .iter()
            .map(|entry| TranslationEntry {
                is_used: usages.references(&entry.key),
                ..entry.clone()
            })
            .collect();
        Self {
            catalog,
            usages,
            entries,
        }
    }

    /// The catalog half, shared with the next reconciliation.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// The usage half, shared with the next reconciliation.
    #[must_use]
    pub fn usage_table(&self) -> Arc<UsageTable> {
        Arc::clone(&self.usages)
    }

    /// Entries for `key` across locales.
    #[must_use]
    pub fn entries(&self, key: &str) -> Vec<&TranslationEntry> {
        self.catalog
            .by_key
            .get(key)
            .map(|hits| hits.iter().filter_map(|&i| self.entries.get(i)).collect())
            .unwrap_or_default()
    }

    /// The value of `key` in `locale`.
    #[must_use]
    pub fn value(&self, key: &str, locale: &str) -> Option<&str> {
        self.entries(key)
            .into_iter()
            .find(|e| e.locale == locale)
            .map(|e| e.value.as_str())
    }

    /// Distinct keys starting with `prefix`, sorted.
    #[must_use]
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .catalog
            .by_key
            .keys()
            .map(String::as_str)
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Every observed locale, sorted.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.catalog.locales
    }

    /// Every entry, reconciled.
    #[must_use]
    pub fn all_entries(&self) -> &[TranslationEntry] {
        &self.entries
    }

    /// Entries no scanned source references.
    #[must_use]
    pub fn unused(&self) -> Vec<&TranslationEntry> {
        self.entries.iter().filter(|e| !e.is_used).collect()
    }

    /// Usage keys defined in no locale, sorted by key.
    #[must_use]
    pub fn missing(&self) -> Vec<MissingTranslation> {
        let mut missing: Vec<MissingTranslation> = self
            .usages
            .by_key
            .iter()
            .filter(|(key, _)| !self.catalog.contains(key))
            .map(|(key, hits)| MissingTranslation {
                key: key.clone(),
                usages: hits
                    .iter()
                    .filter_map(|&i| self.usages.usages.get(i))
                    .cloned()
                    .collect(),
            })
            .collect();
        missing.sort_by(|a, b| a.key.cmp(&b.key));
        missing
    }

    /// Keys absent from some observed locale, sorted by key.
    ///
    /// Computed on each call from the current set of observed locales.
    #[must_use]
    pub fn incomplete(&self) -> Vec<IncompleteTranslation> {
        let locales = &self.catalog.locales;
        let mut incomplete: Vec<IncompleteTranslation> = self
            .catalog
            .by_key
            .iter()
            .filter_map(|(key, hits)| {
                let present: SmallVec<[&str; 4]> = hits
                    .iter()
                    .filter_map(|&i| self.catalog.entries.get(i))
                    .map(|e| e.locale.as_str())
                    .collect();
                let missing_locales: Vec<String> = locales
                    .iter()
                    .filter(|l| !present.contains(&l.as_str()))
                    .cloned()
                    .collect();
                (!missing_locales.is_empty()).then(|| IncompleteTranslation {
                    key: key.clone(),
                    missing_locales,
                })
            })
            .collect();
        incomplete.sort_by(|a, b| a.key.cmp(&b.key));
        incomplete
    }

    /// Every usage of `key`.
    #[must_use]
    pub fn usages(&self, key: &str) -> Vec<&TranslationUsage> {
        self.usages
            .by_key
            .get(key)
            .map(|hits| hits.iter().filter_map(|&i| self.usages.usages.get(i)).collect())
            .unwrap_or_default()
    }

    /// Number of catalog entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of usages.
    #[must_use]
    pub fn usage_count(&self) -> usize {
        self.usages.len()
    }
}
