use serde::{Deserialize, Serialize};

/// Which column of the technique table is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Native,
    English,
}

impl Locale {
    /// Separator between category and technique name.
    pub fn separator(self) -> &'static str {
        match self {
            Locale::Native => "・",
            Locale::English => "：",
        }
    }
}

/// A name given in both locales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalizedName {
    pub native: String,
    pub english: String,
}

impl LocalizedName {
    pub fn new(native: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            native: native.into(),
            english: english.into(),
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Native => &self.native,
            Locale::English => &self.english,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Technique {
    pub category: Option<LocalizedName>,
    pub name: LocalizedName,
    pub pattern: Vec<String>,
}

impl Technique {
    pub fn label(&self, locale: Locale) -> String {
        match &self.category {
            Some(category) => format!(
                "{}{}{}",
                category.get(locale),
                locale.separator(),
                self.name.get(locale)
            ),
            None => self.name.get(locale).to_string(),
        }
    }
}

/// Ordered technique records. Earlier rows win when several match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechniqueTable {
    techniques: Vec<Technique>,
    joined: Vec<String>,
}

impl TechniqueTable {
    pub fn new(techniques: Vec<Technique>) -> Self {
        let joined = techniques.iter().map(|t| t.pattern.concat()).collect();
        Self { techniques, joined }
    }

    /// Index of the first technique whose pattern, concatenated, equals
    /// `history` exactly.
    pub fn find(&self, history: &str) -> Option<usize> {
        if history.is_empty() {
            return None;
        }
        self.joined.iter().position(|pattern| pattern == history)
    }

    pub fn get(&self, index: usize) -> Option<&Technique> {
        self.techniques.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Technique> {
        self.techniques.iter()
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }
}
