use crate::signs::mappings::{ActionTables, SignCombo};
use crate::signs::sign::{SignId, SignLabels};
use crate::signs::techniques::{LocalizedName, Technique, TechniqueTable};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub const SIGNS_FILE: &str = "signs.json";
pub const TECHNIQUES_FILE: &str = "techniques.json";
pub const MAPPINGS_FILE: &str = "mappings.json";
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_SIGNS_JSON: &str = include_str!("../../assets/signs.json");
pub const DEFAULT_TECHNIQUES_JSON: &str = include_str!("../../assets/techniques.json");
pub const DEFAULT_MAPPINGS_JSON: &str = include_str!("../../assets/mappings.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    UnsupportedSchema { table: &'static str, version: u32 },
    EmptyTable { table: &'static str },
    EmptyName { table: &'static str, row: usize },
    EmptyText { row: usize },
    ZeroSign { table: &'static str, row: usize },
    DuplicateSign { row: usize, id: SignId },
    ComboLength { table: &'static str, row: usize, len: usize },
    DuplicateCombo { table: &'static str, row: usize },
    EmptyChord { row: usize },
    EmptyKey { row: usize },
    EmptyPattern { row: usize },
    UnknownPatternSign { row: usize, name: String },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::UnsupportedSchema { table, version } => {
                write!(f, "{table}: unsupported schema version {version}")
            }
            TableError::EmptyTable { table } => write!(f, "{table}: table has no rows"),
            TableError::EmptyName { table, row } => write!(f, "{table} row {row}: empty name"),
            TableError::EmptyText { row } => write!(f, "words row {row}: empty text"),
            TableError::ZeroSign { table, row } => {
                write!(f, "{table} row {row}: sign ids start at 1")
            }
            TableError::DuplicateSign { row, id } => {
                write!(f, "signs row {row}: sign {id} is defined twice")
            }
            TableError::ComboLength { table, row, len } => write!(
                f,
                "{table} row {row}: combos must have 1 to 3 signs, got {len}"
            ),
            TableError::DuplicateCombo { table, row } => {
                write!(f, "{table} row {row}: combo is already bound")
            }
            TableError::EmptyChord { row } => write!(f, "shortcuts row {row}: no keys"),
            TableError::EmptyKey { row } => write!(f, "special_keys row {row}: empty key"),
            TableError::EmptyPattern { row } => write!(f, "techniques row {row}: empty pattern"),
            TableError::UnknownPatternSign { row, name } => {
                write!(f, "techniques row {row}: unknown sign name '{name}'")
            }
        }
    }
}

impl std::error::Error for TableError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SignEntry {
    pub id: SignId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SignsFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub signs: Vec<SignEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TechniqueEntry {
    #[serde(default)]
    pub category: Option<LocalizedName>,
    pub name: LocalizedName,
    pub signs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TechniquesFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub techniques: Vec<TechniqueEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WordEntry {
    pub signs: Vec<SignId>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SpecialKeyEntry {
    pub signs: Vec<SignId>,
    /// `null` marks a release: the combo is consumed but nothing is pressed.
    /// The field must be present so a typo cannot turn into a release.
    #[serde(deserialize_with = "explicit_key")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShortcutEntry {
    pub signs: Vec<SignId>,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MappingsFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub words: Vec<WordEntry>,
    #[serde(default)]
    pub special_keys: Vec<SpecialKeyEntry>,
    #[serde(default)]
    pub shortcuts: Vec<ShortcutEntry>,
}

fn explicit_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Read-only tables shared by every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignTables {
    pub labels: SignLabels,
    pub actions: ActionTables,
    pub techniques: TechniqueTable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub signs: PathBuf,
    pub techniques: PathBuf,
    pub mappings: PathBuf,
}

impl TablePaths {
    /// Default file names next to `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            signs: dir.join(SIGNS_FILE),
            techniques: dir.join(TECHNIQUES_FILE),
            mappings: dir.join(MAPPINGS_FILE),
        }
    }
}

impl SignTables {
    /// Load all three files. Any missing or malformed file is an error.
    pub fn load(paths: &TablePaths) -> anyhow::Result<Self> {
        let signs: SignsFile = read_json(&paths.signs)?;
        let techniques: TechniquesFile = read_json(&paths.techniques)?;
        let mappings: MappingsFile = read_json(&paths.mappings)?;
        let tables = Self::from_files(signs, techniques, mappings)?;
        tracing::info!(
            signs = tables.labels.len(),
            techniques = tables.techniques.len(),
            actions = tables.actions.len(),
            "loaded sign tables"
        );
        Ok(tables)
    }

    /// The tables shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        let signs = serde_json::from_str(DEFAULT_SIGNS_JSON).context("builtin signs")?;
        let techniques =
            serde_json::from_str(DEFAULT_TECHNIQUES_JSON).context("builtin techniques")?;
        let mappings = serde_json::from_str(DEFAULT_MAPPINGS_JSON).context("builtin mappings")?;
        Ok(Self::from_files(signs, techniques, mappings)?)
    }

    pub fn from_files(
        signs: SignsFile,
        techniques: TechniquesFile,
        mappings: MappingsFile,
    ) -> Result<Self, TableError> {
        let labels = build_labels(signs)?;
        let techniques = build_techniques(techniques, &labels)?;
        let actions = build_actions(mappings)?;
        Ok(Self {
            labels,
            actions,
            techniques,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn check_schema(table: &'static str, version: u32) -> Result<(), TableError> {
    if version != SCHEMA_VERSION {
        return Err(TableError::UnsupportedSchema { table, version });
    }
    Ok(())
}

pub fn build_labels(file: SignsFile) -> Result<SignLabels, TableError> {
    check_schema("signs", file.schema_version)?;
    if file.signs.is_empty() {
        return Err(TableError::EmptyTable { table: "signs" });
    }
    let mut names = HashMap::new();
    for (row, entry) in file.signs.into_iter().enumerate() {
        if entry.id.get() == 0 {
            return Err(TableError::ZeroSign { table: "signs", row });
        }
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(TableError::EmptyName { table: "signs", row });
        }
        if names.insert(entry.id, name.to_string()).is_some() {
            return Err(TableError::DuplicateSign { row, id: entry.id });
        }
    }
    Ok(SignLabels::new(names))
}

pub fn build_techniques(
    file: TechniquesFile,
    labels: &SignLabels,
) -> Result<TechniqueTable, TableError> {
    check_schema("techniques", file.schema_version)?;
    let known: HashSet<&str> = labels.iter().map(|(_, name)| name).collect();
    let mut techniques = Vec::with_capacity(file.techniques.len());
    for (row, entry) in file.techniques.into_iter().enumerate() {
        if entry.name.native.trim().is_empty() || entry.name.english.trim().is_empty() {
            return Err(TableError::EmptyName {
                table: "techniques",
                row,
            });
        }
        if entry.signs.is_empty() {
            return Err(TableError::EmptyPattern { row });
        }
        if let Some(name) = entry.signs.iter().find(|name| !known.contains(name.as_str())) {
            return Err(TableError::UnknownPatternSign {
                row,
                name: name.clone(),
            });
        }
        // A blank native category means the technique has no category.
        let category = entry.category.filter(|c| !c.native.trim().is_empty());
        techniques.push(Technique {
            category,
            name: entry.name,
            pattern: entry.signs,
        });
    }
    Ok(TechniqueTable::new(techniques))
}

fn parse_combo(table: &'static str, row: usize, signs: &[SignId]) -> Result<SignCombo, TableError> {
    if signs.iter().any(|sign| sign.get() == 0) {
        return Err(TableError::ZeroSign { table, row });
    }
    SignCombo::from_slice(signs).ok_or(TableError::ComboLength {
        table,
        row,
        len: signs.len(),
    })
}

pub fn build_actions(file: MappingsFile) -> Result<ActionTables, TableError> {
    check_schema("mappings", file.schema_version)?;
    let mut tables = ActionTables::new();

    for (row, entry) in file.words.into_iter().enumerate() {
        let combo = parse_combo("words", row, &entry.signs)?;
        if entry.text.is_empty() {
            return Err(TableError::EmptyText { row });
        }
        if !tables.insert_word(combo, entry.text) {
            return Err(TableError::DuplicateCombo { table: "words", row });
        }
    }

    for (row, entry) in file.special_keys.into_iter().enumerate() {
        let combo = parse_combo("special_keys", row, &entry.signs)?;
        if entry.key.as_deref().is_some_and(|key| key.trim().is_empty()) {
            return Err(TableError::EmptyKey { row });
        }
        let key = entry.key.map(|key| key.trim().to_string());
        if !tables.insert_special_key(combo, key) {
            return Err(TableError::DuplicateCombo {
                table: "special_keys",
                row,
            });
        }
    }

    for (row, entry) in file.shortcuts.into_iter().enumerate() {
        let combo = parse_combo("shortcuts", row, &entry.signs)?;
        let keys: Vec<String> = entry
            .keys
            .iter()
            .map(|key| key.trim().to_string())
            .collect();
        if keys.is_empty() || keys.iter().any(String::is_empty) {
            return Err(TableError::EmptyChord { row });
        }
        if !tables.insert_shortcut(combo, keys) {
            return Err(TableError::DuplicateCombo {
                table: "shortcuts",
                row,
            });
        }
    }

    Ok(tables)
}
