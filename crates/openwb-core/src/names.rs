// ── Friendly names ──
//
// Display names for raw status keys. The table is data, not code: a
// built-in TOML table ships with the crate and configuration may extend
// or override it. Lookup is case-insensitive (`wallboxTemp` and
// `wallboxtemp` are the same sensor). Keys without an entry get a name
// derived from the key itself.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::warn;

const BUILTIN_NAMES: &str = include_str!("../data/names.toml");

static BUILTIN: LazyLock<NameTable> = LazyLock::new(|| {
    NameTable::from_toml_str(BUILTIN_NAMES).unwrap_or_else(|err| {
        warn!(error = %err, "built-in name table is invalid, falling back to derived names");
        NameTable::default()
    })
});

/// Languages the name table carries translations for.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    En,
    De,
}

/// Language-keyed lookup: raw key -> translated label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    by_language: HashMap<Language, HashMap<String, String>>,
}

impl NameTable {
    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// An empty table: every key falls back to its derived name.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a table from TOML with one section per language. Sections
    /// for unsupported languages are skipped.
    pub fn from_toml_str(src: &str) -> Result<Self, toml::de::Error> {
        let raw: HashMap<String, HashMap<String, String>> = toml::from_str(src)?;
        let mut table = Self::default();
        table.extend_sections(raw);
        Ok(table)
    }

    /// Merge sections keyed by language code (`"en"`, `"de"`), as found in
    /// TOML files. Unknown codes are skipped.
    pub fn extend_sections(&mut self, sections: HashMap<String, HashMap<String, String>>) {
        let mut by_language = HashMap::new();
        for (section, names) in sections {
            match section.parse::<Language>() {
                Ok(lang) => {
                    by_language.insert(lang, names);
                }
                Err(_) => warn!(section = %section, "ignoring names for unsupported language"),
            }
        }
        self.extend(by_language);
    }

    /// Build a table from nested maps, normalizing keys.
    pub fn from_map(raw: HashMap<Language, HashMap<String, String>>) -> Self {
        let mut table = Self::default();
        table.extend(raw);
        table
    }

    /// Merge `overrides` into this table; later entries win.
    pub fn extend(&mut self, overrides: HashMap<Language, HashMap<String, String>>) {
        for (lang, names) in overrides {
            let target = self.by_language.entry(lang).or_default();
            for (key, name) in names {
                target.insert(key.to_lowercase(), name);
            }
        }
    }

    /// Translated name for `key`, trying `language` first, then English.
    pub fn lookup(&self, key: &str, language: Language) -> Option<&str> {
        let key = key.to_lowercase();
        let find = |lang: Language| {
            self.by_language
                .get(&lang)
                .and_then(|names| names.get(&key))
                .map(String::as_str)
        };
        find(language).or_else(|| {
            if language == Language::En {
                None
            } else {
                find(Language::En)
            }
        })
    }

    /// Translated name for `key`, or the derived name when the table has
    /// no entry.
    pub fn resolve(&self, key: &str, language: Language) -> String {
        self.lookup(key, language)
            .map_or_else(|| derive_name(key), String::from)
    }

    pub fn len(&self, language: Language) -> usize {
        self.by_language.get(&language).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.values().all(HashMap::is_empty)
    }
}

/// Mechanical display name: `_` and `-` become spaces, and each run of
/// letters starts upper-case with the rest lower-case.
///
/// `new_sensor_42` -> `New Sensor 42`, `plugstatLP1` -> `Plugstatlp1`.
pub fn derive_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut prev_alpha = false;
    for c in key.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn derive_name_replaces_separators_and_capitalizes() {
        assert_eq!(derive_name("new_sensor_42"), "New Sensor 42");
        assert_eq!(derive_name("plug-state"), "Plug State");
        assert_eq!(derive_name("plugstatLP1"), "Plugstatlp1");
        assert_eq!(derive_name("lp1a"), "Lp1A");
        assert_eq!(derive_name(""), "");
    }

    #[test]
    fn builtin_table_has_both_languages() {
        let table = NameTable::builtin();
        for lang in Language::iter() {
            assert!(table.len(lang) > 40, "{lang} table too small");
        }
        assert_eq!(
            table.lookup("speichersoc", Language::En),
            Some("Battery state of charge")
        );
        assert_eq!(
            table.lookup("speichersoc", Language::De),
            Some("Speicher Ladestand")
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = NameTable::builtin();
        assert_eq!(
            table.lookup("wallboxTemp", Language::En),
            Some("Wallbox temperature")
        );
        assert_eq!(
            table.lookup("plugstatLP1", Language::En),
            Some("Charge point 1 plug state")
        );
    }

    #[test]
    fn missing_translation_falls_back_to_english_then_derived() {
        let mut raw = HashMap::new();
        raw.insert(
            Language::En,
            HashMap::from([("soc".to_owned(), "State of charge".to_owned())]),
        );
        let table = NameTable::from_map(raw);

        assert_eq!(table.resolve("soc", Language::De), "State of charge");
        assert_eq!(table.resolve("new_sensor_42", Language::De), "New Sensor 42");
    }

    #[test]
    fn empty_table_derives_everything() {
        let table = NameTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.resolve("plug_state", Language::En), "Plug State");
    }

    #[test]
    fn overrides_win() {
        let mut table = NameTable::builtin();
        table.extend(HashMap::from([(
            Language::En,
            HashMap::from([("PVW".to_owned(), "Solar".to_owned())]),
        )]));
        assert_eq!(table.resolve("pvw", Language::En), "Solar");
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("DE".parse::<Language>().ok(), Some(Language::De));
        assert_eq!(Language::En.to_string(), "en");
    }
}
