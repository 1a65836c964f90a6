//! Fx-hashed map and set aliases.
//!
//! Index keys (controller actions, model names, translation keys) are short
//! strings taken from the analysed project, so the non-DoS-resistant Fx hash
//! from `rustc-hash` is used throughout.

/// [`HashMap`](std::collections::HashMap) with the Fx hasher.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// [`HashSet`](std::collections::HashSet) with the Fx hasher.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_keys() {
        let mut locales: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();
        for (key, locale) in [("auth.failed", "en"), ("auth.failed", "fr"), ("auth.failed", "en")] {
            locales.entry(key).or_default().insert(locale);
        }
        assert_eq!(locales["auth.failed"].len(), 2);
    }
}
