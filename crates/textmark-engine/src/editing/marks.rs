use serde::{Deserialize, Serialize};

/// Closed set of mark kinds the document understands.
///
/// Mark filtering (e.g. "never inherit a prior inserted tag") compares these
/// variants directly rather than matching on name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Bold,
    Italic,
    Code,
    Link,
    /// Tags a run produced by a text transform. Applied fresh on every
    /// replacement, never inherited from the source run.
    InsertedText,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
            MarkKind::Code => "code",
            MarkKind::Link => "link",
            MarkKind::InsertedText => "insertedText",
        }
    }
}

/// A named, attributed annotation applicable to a run of text.
///
/// Serializes as `{"type": ..., "attrs": {...}}` and must survive a host's
/// own parse/serialize cycle unchanged, so attribute values stay as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

impl Mark {
    /// Mark with no attributes.
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: serde_json::Map::new(),
        }
    }

    pub fn with_attr(kind: MarkKind, key: &str, value: serde_json::Value) -> Self {
        let mut attrs = serde_json::Map::new();
        attrs.insert(key.to_string(), value);
        Self { kind, attrs }
    }
}

/// Ordered set of marks, unique by kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a mark. A mark of the same kind already in the set is replaced in
    /// place, keeping its position in the order.
    pub fn add(&mut self, mark: Mark) {
        if let Some(existing) = self.0.iter_mut().find(|m| m.kind == mark.kind) {
            *existing = mark;
        } else {
            self.0.push(mark);
        }
    }

    pub fn contains(&self, kind: MarkKind) -> bool {
        self.0.iter().any(|m| m.kind == kind)
    }

    pub fn get(&self, kind: MarkKind) -> Option<&Mark> {
        self.0.iter().find(|m| m.kind == kind)
    }

    /// Copy of this set with every mark of `kind` removed.
    pub fn without(&self, kind: MarkKind) -> MarkSet {
        MarkSet(self.0.iter().filter(|m| m.kind != kind).cloned().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<T: IntoIterator<Item = Mark>>(iter: T) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.add(mark);
        }
        set
    }
}

impl IntoIterator for MarkSet {
    type Item = Mark;
    type IntoIter = std::vec::IntoIter<Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
