//! Configuration and environment key collection.
//!
//! The table starts from a fixed list of framework keys so an empty project
//! still answers the common lookups. Project files then add to it, and a key
//! declared in a file replaces the seeded entry of the same name.

use camino::Utf8Path;
use cv_core::{ConfigKey, EnvKey, FxHashMap, FxHashSet, KeyOrigin};
use cv_extract::{ConfigNode, EnvLine, EnvReference};

const WELL_KNOWN_CONFIG: &[&str] = &[
    "app.name",
    "app.env",
    "app.debug",
    "app.url",
    "app.timezone",
    "app.locale",
    "app.fallback_locale",
    "app.faker_locale",
    "app.key",
    "app.cipher",
    "app.providers",
    "app.aliases",
    "auth.defaults.guard",
    "auth.defaults.passwords",
    "auth.guards",
    "auth.providers",
    "auth.passwords",
    "broadcasting.default",
    "cache.default",
    "cache.stores",
    "cache.prefix",
    "database.default",
    "database.connections",
    "database.migrations",
    "database.redis",
    "filesystems.default",
    "filesystems.disks",
    "logging.default",
    "logging.channels",
    "mail.default",
    "mail.mailers",
    "mail.from.address",
    "mail.from.name",
    "queue.default",
    "queue.connections",
    "queue.failed",
    "services.mailgun",
    "services.ses",
    "session.driver",
    "session.lifetime",
    "session.cookie",
    "session.domain",
    "view.paths",
    "view.compiled",
];

const WELL_KNOWN_ENV: &[&str] = &[
    "APP_NAME",
    "APP_ENV",
    "APP_KEY",
    "APP_DEBUG",
    "APP_URL",
    "APP_LOCALE",
    "LOG_CHANNEL",
    "LOG_LEVEL",
    "DB_CONNECTION",
    "DB_HOST",
    "DB_PORT",
    "DB_DATABASE",
    "DB_USERNAME",
    "DB_PASSWORD",
    "BROADCAST_DRIVER",
    "CACHE_DRIVER",
    "CACHE_STORE",
    "FILESYSTEM_DISK",
    "QUEUE_CONNECTION",
    "SESSION_DRIVER",
    "SESSION_LIFETIME",
    "REDIS_HOST",
    "REDIS_PASSWORD",
    "REDIS_PORT",
    "MAIL_MAILER",
    "MAIL_HOST",
    "MAIL_PORT",
    "MAIL_USERNAME",
    "MAIL_PASSWORD",
    "MAIL_FROM_ADDRESS",
    "MAIL_FROM_NAME",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_DEFAULT_REGION",
    "AWS_BUCKET",
];

/// Accumulates keys from seeds and project files.
///
/// Precedence, lowest first: seeds, `env()` defaults found in config files,
/// then `.env*` declarations. Among environment files the first one added
/// wins, so `.env` outranks `.env.example` when added in that order.
#[derive(Debug, Clone)]
pub struct KeyTableBuilder {
    config: FxHashMap<String, ConfigKey>,
    env: FxHashMap<String, EnvKey>,
    declared_env: FxHashSet<String>,
}

impl Default for KeyTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTableBuilder {
    /// Creates a builder holding only the well-known keys.
    #[must_use]
    pub fn new() -> Self {
        let config = WELL_KNOWN_CONFIG
            .iter()
            .map(|key| {
                let entry = ConfigKey {
                    key: (*key).to_owned(),
                    value: None,
                    origin: KeyOrigin::WellKnown,
                };
                ((*key).to_owned(), entry)
            })
            .collect();
        let env = WELL_KNOWN_ENV
            .iter()
            .map(|key| {
                let entry = EnvKey {
                    key: (*key).to_owned(),
                    value: None,
                    origin: KeyOrigin::WellKnown,
                };
                ((*key).to_owned(), entry)
            })
            .collect();
        Self {
            config,
            env,
            declared_env: FxHashSet::default(),
        }
    }

    /// Adds the nodes of one configuration file.
    pub fn add_config_nodes(&mut self, file: &Utf8Path, nodes: Vec<ConfigNode>) {
        for node in nodes {
            let entry = ConfigKey {
                key: node.key.clone(),
                value: node.value,
                origin: KeyOrigin::File {
                    path: file.to_owned(),
                    line: node.line,
                },
            };
            self.config.insert(node.key, entry);
        }
    }

    /// Adds `env()` references found in a configuration file.
    ///
    /// A reference never replaces a key another file already declared.
    pub fn add_env_references(&mut self, file: &Utf8Path, references: Vec<EnvReference>) {
        for reference in references {
            let declared = self
                .env
                .get(&reference.key)
                .is_some_and(|existing| existing.origin.is_file());
            if declared {
                continue;
            }
            let entry = EnvKey {
                key: reference.key.clone(),
                value: reference.default,
                origin: KeyOrigin::File {
                    path: file.to_owned(),
                    line: reference.line,
                },
            };
            self.env.insert(reference.key, entry);
        }
    }

    /// Adds the declarations of one environment file.
    pub fn add_env_file(&mut self, file: &Utf8Path, lines: Vec<EnvLine>) {
        for line in lines {
            if !self.declared_env.insert(line.key.clone()) {
                continue;
            }
            let entry = EnvKey {
                key: line.key.clone(),
                value: Some(line.value),
                origin: KeyOrigin::File {
                    path: file.to_owned(),
                    line: line.line,
                },
            };
            self.env.insert(line.key, entry);
        }
    }

    /// Freezes the keys into a sorted table.
    #[must_use]
    pub fn build(self) -> KeyTable {
        let mut config: Vec<ConfigKey> = self.config.into_values().collect();
        config.sort_by(|a, b| a.key.cmp(&b.key));
        let mut env: Vec<EnvKey> = self.env.into_values().collect();
        env.sort_by(|a, b| a.key.cmp(&b.key));

        let config_index = config
            .iter()
            .enumerate()
            .map(|(i, k)| (k.key.clone(), i))
            .collect();
        let env_index = env
            .iter()
            .enumerate()
            .map(|(i, k)| (k.key.clone(), i))
            .collect();
        KeyTable {
            config,
            config_index,
            env,
            env_index,
        }
    }
}

/// Every known configuration and environment key, sorted by key.
///
/// # Examples
///
/// ```
/// use cv_index::KeyTable;
///
/// let table = KeyTable::default();
/// assert!(table.config_key("app.name").is_some());
/// assert!(table.env_key("APP_ENV").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct KeyTable {
    config: Vec<ConfigKey>,
    config_index: FxHashMap<String, usize>,
    env: Vec<EnvKey>,
    env_index: FxHashMap<String, usize>,
}

impl Default for KeyTable {
    fn default() -> Self {
        KeyTableBuilder::new().build()
    }
}

impl KeyTable {
    /// Looks up a configuration key.
    #[must_use]
    pub fn config_key(&self, key: &str) -> Option<&ConfigKey> {
        self.config_index.get(key).and_then(|&i| self.config.get(i))
    }

    /// Configuration keys starting with `prefix`.
    #[must_use]
    pub fn config_keys_with_prefix(&self, prefix: &str) -> Vec<&ConfigKey> {
        self.config.iter().filter(|k| k.key.starts_with(prefix)).collect()
    }

    /// Looks up an environment variable.
    #[must_use]
    pub fn env_key(&self, key: &str) -> Option<&EnvKey> {
        self.env_index.get(key).and_then(|&i| self.env.get(i))
    }

    /// Environment variables starting with `prefix`.
    #[must_use]
    pub fn env_keys_with_prefix(&self, prefix: &str) -> Vec<&EnvKey> {
        self.env.iter().filter(|k| k.key.starts_with(prefix)).collect()
    }

    /// Every configuration key.
    #[inline]
    #[must_use]
    pub fn all_config_keys(&self) -> &[ConfigKey] {
        &self.config
    }

    /// Every environment variable.
    #[inline]
    #[must_use]
    pub fn all_env_keys(&self) -> &[EnvKey] {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_extract::config_keys::{env_references, extract_config_keys, parse_env_file};

    const APP: &str = "<?php\nreturn [\n    'name' => env('APP_NAME', 'Laravel'),\n    'locale' => 'fr',\n    'custom' => ['flag' => true],\n];\n";

    #[test]
    fn test_seeds_exist_in_empty_project() {
        let table = KeyTable::default();
        let key = table.config_key("database.default").unwrap();
        assert_eq!(key.origin, KeyOrigin::WellKnown);
        assert_eq!(table.env_key("DB_HOST").unwrap().value, None);
        assert!(table.config_key("app.custom").is_none());
    }

    #[test]
    fn test_file_keys_override_seeds() {
        let file = Utf8Path::new("config/app.php");
        let mut builder = KeyTableBuilder::new();
        builder.add_config_nodes(file, extract_config_keys(APP, "app").unwrap());
        builder.add_env_references(file, env_references(APP));
        let table = builder.build();

        let locale = table.config_key("app.locale").unwrap();
        assert_eq!(locale.value.as_deref(), Some("fr"));
        assert_eq!(
            locale.origin,
            KeyOrigin::File {
                path: file.to_owned(),
                line: 4
            }
        );
        assert!(table.config_key("app.custom").is_some());
        assert!(table.config_key("app.custom.flag").is_some());
        assert_eq!(table.env_key("APP_NAME").unwrap().value.as_deref(), Some("Laravel"));
    }

    #[test]
    fn test_env_file_precedence() {
        let config = Utf8Path::new("config/app.php");
        let mut builder = KeyTableBuilder::new();
        builder.add_env_file(Utf8Path::new(".env"), parse_env_file("APP_NAME=Shop\n"));
        builder.add_env_file(Utf8Path::new(".env.example"), parse_env_file("APP_NAME=Example\nEXTRA=1\n"));
        builder.add_env_references(config, env_references(APP));
        let table = builder.build();

        let name = table.env_key("APP_NAME").unwrap();
        assert_eq!(name.value.as_deref(), Some("Shop"));
        assert!(matches!(&name.origin, KeyOrigin::File { path, .. } if path == ".env"));
        assert_eq!(table.env_key("EXTRA").unwrap().value.as_deref(), Some("1"));
    }

    #[test]
    fn test_prefix_queries_are_sorted() {
        let table = KeyTable::default();
        let keys: Vec<_> = table
            .env_keys_with_prefix("DB_")
            .into_iter()
            .map(|k| k.key.as_str())
            .collect();
        assert_eq!(keys, vec!["DB_CONNECTION", "DB_DATABASE", "DB_HOST", "DB_PASSWORD", "DB_PORT", "DB_USERNAME"]);
        assert_eq!(table.config_keys_with_prefix("mail.from").len(), 2);
    }
}
