use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label shown for a sign id that has no entry in the label table.
pub const UNKNOWN_SIGN_LABEL: &str = "?";

/// A resolved hand sign identifier.
///
/// Ids are 1-based. The classifier reports 0-based class indices which are
/// converted with [`SignId::from_class_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignId(pub u16);

impl SignId {
    pub fn from_class_index(index: u16) -> Self {
        SignId(index.saturating_add(1))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for SignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Axis aligned box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Square with the side of the longer edge, centred on this box.
    pub fn square(&self) -> BBox {
        let side = (self.x2 - self.x1).max(self.y2 - self.y1);
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0;
        let x1 = (cx - side / 2.0).trunc();
        let y1 = (cy - side / 2.0).trunc();
        BBox {
            x1,
            y1,
            x2: x1 + side,
            y2: y1 + side,
        }
    }
}

/// One classifier result as reported by the adapter (0-based class index).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "box")]
    pub bbox: BBox,
    pub score: f32,
    pub class_index: u16,
}

/// A classifier result mapped onto the sign domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    pub confidence: f32,
    pub sign: SignId,
}

impl From<RawDetection> for Detection {
    fn from(raw: RawDetection) -> Self {
        Self {
            bbox: raw.bbox,
            confidence: raw.score,
            sign: SignId::from_class_index(raw.class_index),
        }
    }
}

/// Display names of the known signs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignLabels {
    names: HashMap<SignId, String>,
}

impl SignLabels {
    pub fn new(names: HashMap<SignId, String>) -> Self {
        Self { names }
    }

    pub fn name(&self, sign: SignId) -> Option<&str> {
        self.names.get(&sign).map(String::as_str)
    }

    /// Name for display; unknown ids render as [`UNKNOWN_SIGN_LABEL`].
    pub fn label(&self, sign: SignId) -> &str {
        self.name(sign).unwrap_or(UNKNOWN_SIGN_LABEL)
    }

    /// Concatenated names used for technique matching. Unknown ids contribute
    /// nothing.
    pub fn concat<'a, I>(&self, signs: I) -> String
    where
        I: IntoIterator<Item = &'a SignId>,
    {
        signs
            .into_iter()
            .filter_map(|sign| self.name(*sign))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignId, &str)> {
        let mut entries: Vec<_> = self
            .names
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter()
    }
}
