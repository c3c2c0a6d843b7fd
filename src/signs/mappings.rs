use crate::signs::sign::SignId;
use std::collections::HashMap;

/// A fixed-length run of one to three signs used as an action key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignCombo {
    One(SignId),
    Two(SignId, SignId),
    Three(SignId, SignId, SignId),
}

impl SignCombo {
    pub fn from_slice(signs: &[SignId]) -> Option<Self> {
        match *signs {
            [a] => Some(SignCombo::One(a)),
            [a, b] => Some(SignCombo::Two(a, b)),
            [a, b, c] => Some(SignCombo::Three(a, b, c)),
            _ => None,
        }
    }

    /// The last `len` signs of `pending`, if there are that many.
    pub fn trailing(pending: &[SignId], len: usize) -> Option<Self> {
        if len == 0 || pending.len() < len {
            return None;
        }
        Self::from_slice(&pending[pending.len() - len..])
    }

    pub fn len(&self) -> usize {
        match self {
            SignCombo::One(..) => 1,
            SignCombo::Two(..) => 2,
            SignCombo::Three(..) => 3,
        }
    }

    pub fn signs(&self) -> Vec<SignId> {
        match *self {
            SignCombo::One(a) => vec![a],
            SignCombo::Two(a, b) => vec![a, b],
            SignCombo::Three(a, b, c) => vec![a, b, c],
        }
    }
}

/// Which table produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Word,
    SpecialKey,
    Shortcut,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Word => "word",
            ActionKind::SpecialKey => "special_key",
            ActionKind::Shortcut => "shortcut",
        }
    }
}

/// What a matched combo produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPayload {
    /// Type literal text.
    Text(String),
    /// Press a single key. `None` is a release marker and injects nothing.
    Key(Option<String>),
    /// Press the keys in order and release them in reverse.
    Chord(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMatch {
    pub kind: ActionKind,
    pub combo: SignCombo,
    pub payload: ActionPayload,
}

// Suffix lengths tried per table, in order. Shortcuts skip length 2.
const WORD_SLICES: &[usize] = &[1, 2];
const SPECIAL_KEY_SLICES: &[usize] = &[1, 2, 3];
const SHORTCUT_SLICES: &[usize] = &[1, 3];

/// The three action tables, searched word -> special key -> shortcut.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTables {
    words: HashMap<SignCombo, String>,
    special_keys: HashMap<SignCombo, Option<String>>,
    shortcuts: HashMap<SignCombo, Vec<String>>,
}

impl ActionTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the combo was already bound.
    pub fn insert_word(&mut self, combo: SignCombo, text: impl Into<String>) -> bool {
        self.words.insert(combo, text.into()).is_none()
    }

    pub fn insert_special_key(&mut self, combo: SignCombo, key: Option<String>) -> bool {
        self.special_keys.insert(combo, key).is_none()
    }

    pub fn insert_shortcut(&mut self, combo: SignCombo, keys: Vec<String>) -> bool {
        self.shortcuts.insert(combo, keys).is_none()
    }

    pub fn words(&self) -> &HashMap<SignCombo, String> {
        &self.words
    }

    pub fn special_keys(&self) -> &HashMap<SignCombo, Option<String>> {
        &self.special_keys
    }

    pub fn shortcuts(&self) -> &HashMap<SignCombo, Vec<String>> {
        &self.shortcuts
    }

    pub fn len(&self) -> usize {
        self.words.len() + self.special_keys.len() + self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first binding matching a suffix of `pending`.
    pub fn match_pending(&self, pending: &[SignId]) -> Option<ActionMatch> {
        self.match_words(pending)
            .or_else(|| self.match_special_keys(pending))
            .or_else(|| self.match_shortcuts(pending))
    }

    fn match_words(&self, pending: &[SignId]) -> Option<ActionMatch> {
        let (combo, text) = find_suffix(&self.words, pending, WORD_SLICES)?;
        Some(ActionMatch {
            kind: ActionKind::Word,
            combo,
            payload: ActionPayload::Text(text.clone()),
        })
    }

    fn match_special_keys(&self, pending: &[SignId]) -> Option<ActionMatch> {
        let (combo, key) = find_suffix(&self.special_keys, pending, SPECIAL_KEY_SLICES)?;
        Some(ActionMatch {
            kind: ActionKind::SpecialKey,
            combo,
            payload: ActionPayload::Key(key.clone()),
        })
    }

    fn match_shortcuts(&self, pending: &[SignId]) -> Option<ActionMatch> {
        let (combo, keys) = find_suffix(&self.shortcuts, pending, SHORTCUT_SLICES)?;
        Some(ActionMatch {
            kind: ActionKind::Shortcut,
            combo,
            payload: ActionPayload::Chord(keys.clone()),
        })
    }
}

fn find_suffix<'a, V>(
    table: &'a HashMap<SignCombo, V>,
    pending: &[SignId],
    lengths: &[usize],
) -> Option<(SignCombo, &'a V)> {
    lengths.iter().find_map(|&len| {
        let combo = SignCombo::trailing(pending, len)?;
        table.get(&combo).map(|value| (combo, value))
    })
}
