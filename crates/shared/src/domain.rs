use serde::{Deserialize, Serialize};

macro_rules! index_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub usize);
    };
}

index_newtype!(ModelIndex);
index_newtype!(ClothesIndex);

/// One or many asset paths for a catalog entry. Several paths are clothing
/// variants of the same character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetPaths {
    Single(String),
    Variants(Vec<String>),
}

impl AssetPaths {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Variants(paths) => paths.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, clothes: ClothesIndex) -> Option<&str> {
        match self {
            Self::Single(path) if clothes.0 == 0 => Some(path.as_str()),
            Self::Single(_) => None,
            Self::Variants(paths) => paths.get(clothes.0).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub path: AssetPaths,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: AssetPaths::Single(path.into()),
        }
    }

    pub fn with_variants(name: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path: AssetPaths::Variants(paths),
        }
    }
}

/// Ordered list of selectable models. Order drives "next model" cycling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: ModelIndex) -> Option<&ModelEntry> {
        self.entries.get(index.0)
    }

    /// First entry whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Option<ModelIndex> {
        self.entries
            .iter()
            .position(|entry| entry.name == name)
            .map(ModelIndex)
    }

    pub fn variant_count(&self, index: ModelIndex) -> usize {
        self.get(index).map_or(0, |entry| entry.path.len())
    }

    pub fn contains(&self, selection: Selection) -> bool {
        selection.clothes.0 < self.variant_count(selection.model)
    }

    pub fn next_index(&self, current: ModelIndex) -> Option<ModelIndex> {
        if self.entries.is_empty() {
            return None;
        }
        Some(ModelIndex((current.0 + 1) % self.entries.len()))
    }

    pub fn asset_path(&self, selection: Selection) -> Option<&str> {
        self.get(selection.model)?.path.get(selection.clothes)
    }
}

/// The active `(model, clothes)` pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub model: ModelIndex,
    pub clothes: ClothesIndex,
}

impl Selection {
    pub fn new(model: usize, clothes: usize) -> Self {
        Self {
            model: ModelIndex(model),
            clothes: ClothesIndex(clothes),
        }
    }

    pub fn model(model: ModelIndex) -> Self {
        Self {
            model,
            clothes: ClothesIndex::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportClass {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn classify(&self, mobile_breakpoint: u32) -> ViewportClass {
        if self.width <= mobile_breakpoint {
            ViewportClass::Mobile
        } else {
            ViewportClass::Desktop
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}
