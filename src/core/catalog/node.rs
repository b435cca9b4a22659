//! Content-tree nodes and their resolution.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{error, warn};

use crate::core::locale::{DEFAULT_LOCALE, Locale};

/// Errors raised while constructing or resolving a content tree.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// Neither the requested nor the default locale is present on a leaf.
    #[error("no value for requested or default locale at '{path}'")]
    MissingLocaleData { path: String },

    /// A leaf mixes value shapes (strings next to lists, or scalar values
    /// next to nested nodes under locale keys).
    #[error("leaf at '{path}' mixes value shapes")]
    MixedLeafValues { path: String },

    /// A plain string or string list appeared outside a locale-keyed leaf.
    #[error("value at '{path}' is not locale-keyed content")]
    UnlocalizedValue { path: String },

    /// An object with no keys cannot be classified.
    #[error("empty node at '{path}'")]
    EmptyNode { path: String },

    #[error("catalog source is not valid JSON: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// The per-locale payload of a leaf. All values within one leaf share a
/// shape; the constructor rejects mixed leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafValue {
    Text(String),
    List(Vec<String>),
}

impl LeafValue {
    fn is_list(&self) -> bool {
        matches!(self, LeafValue::List(_))
    }
}

/// A node of the content tree, classified at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    /// One value per locale code.
    Leaf(BTreeMap<Locale, LeafValue>),
    /// Named children, deterministic key order.
    Branch(BTreeMap<String, ContentNode>),
    /// Indexed children; each element is resolved independently.
    Sequence(Vec<ContentNode>),
}

impl ContentNode {
    /// Build a leaf from explicit locale/value pairs, bypassing the
    /// key-shape heuristic of [`ContentNode::from_json`].
    pub fn leaf(
        values: impl IntoIterator<Item = (Locale, LeafValue)>,
    ) -> CatalogResult<ContentNode> {
        let values: BTreeMap<Locale, LeafValue> = values.into_iter().collect();
        if values.is_empty() {
            return Err(CatalogError::EmptyNode {
                path: "$".to_string(),
            });
        }
        let mut shapes = values.values().map(LeafValue::is_list);
        let first = shapes.next().unwrap_or(false);
        if shapes.any(|is_list| is_list != first) {
            return Err(CatalogError::MixedLeafValues {
                path: "$".to_string(),
            });
        }
        Ok(ContentNode::Leaf(values))
    }

    /// Build a branch from explicit named children.
    pub fn branch(
        children: impl IntoIterator<Item = (String, ContentNode)>,
    ) -> ContentNode {
        ContentNode::Branch(children.into_iter().collect())
    }

    /// Parse and classify a JSON value into a content tree.
    ///
    /// An object is a leaf iff every key is a member of the closed locale
    /// set **and** every value is a string or a list of strings; an object
    /// whose keys merely coincide with locale codes but whose values are
    /// nested nodes stays a branch. Bare strings or string lists outside a
    /// leaf are rejected: all displayable text must be locale-keyed.
    pub fn from_json(value: &Value) -> CatalogResult<ContentNode> {
        Self::from_json_at(value, "$")
    }

    fn from_json_at(value: &Value, path: &str) -> CatalogResult<ContentNode> {
        match value {
            Value::Object(map) => {
                if map.is_empty() {
                    return Err(CatalogError::EmptyNode {
                        path: path.to_string(),
                    });
                }
                let all_locale_keys = map.keys().all(|k| Locale::is_locale_code(k));
                if all_locale_keys {
                    let leaf_shaped = map.values().all(leaf_shaped_value);
                    let none_leaf_shaped = map.values().all(|v| !leaf_shaped_value(v));
                    if leaf_shaped {
                        return Self::leaf_from_object(map, path);
                    }
                    if !none_leaf_shaped {
                        // Locale keys over a mix of scalars and nested nodes
                        // cannot be classified either way.
                        return Err(CatalogError::MixedLeafValues {
                            path: path.to_string(),
                        });
                    }
                    // Keys coincide with locale codes but the values are
                    // nested nodes: a branch after all.
                }
                let mut children = BTreeMap::new();
                for (key, child) in map {
                    let child_path = format!("{path}.{key}");
                    children.insert(key.clone(), Self::from_json_at(child, &child_path)?);
                }
                Ok(ContentNode::Branch(children))
            }
            Value::Array(items) => {
                if !items.is_empty() && items.iter().all(|v| v.is_string()) {
                    return Err(CatalogError::UnlocalizedValue {
                        path: path.to_string(),
                    });
                }
                let mut children = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let child_path = format!("{path}[{idx}]");
                    children.push(Self::from_json_at(item, &child_path)?);
                }
                Ok(ContentNode::Sequence(children))
            }
            _ => Err(CatalogError::UnlocalizedValue {
                path: path.to_string(),
            }),
        }
    }

    fn leaf_from_object(
        map: &serde_json::Map<String, Value>,
        path: &str,
    ) -> CatalogResult<ContentNode> {
        let mut values = BTreeMap::new();
        let mut shape: Option<bool> = None;
        for (key, raw) in map {
            // Key membership was checked by the caller.
            let Some(locale) = Locale::parse(key) else {
                continue;
            };
            let value = match raw {
                Value::String(s) => LeafValue::Text(s.clone()),
                Value::Array(items) => {
                    let texts = items
                        .iter()
                        .map(|v| v.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| CatalogError::MixedLeafValues {
                            path: format!("{path}.{key}"),
                        })?;
                    LeafValue::List(texts)
                }
                _ => {
                    return Err(CatalogError::MixedLeafValues {
                        path: format!("{path}.{key}"),
                    });
                }
            };
            match shape {
                None => shape = Some(value.is_list()),
                Some(is_list) if is_list != value.is_list() => {
                    return Err(CatalogError::MixedLeafValues {
                        path: path.to_string(),
                    });
                }
                Some(_) => {}
            }
            values.insert(locale, value);
        }
        if !values.contains_key(&DEFAULT_LOCALE) {
            // Tolerated at construction; resolution of a locale the leaf
            // does not carry will be a MissingLocaleData error instead of
            // a silent substitute.
            warn!("leaf at '{path}' has no {DEFAULT_LOCALE} fallback value");
        }
        Ok(ContentNode::Leaf(values))
    }

    /// Resolve the tree to a locale-specific view. Leaf lookup order is
    /// the requested locale, then the designated default; a leaf carrying
    /// neither is a [`CatalogError::MissingLocaleData`], never a silent
    /// substitution of some other locale's value.
    pub fn resolve(&self, locale: Locale) -> CatalogResult<ResolvedNode> {
        self.resolve_at(locale, "$", true)
    }

    /// Resolve like [`ContentNode::resolve`], but degrade unresolvable
    /// leaves to an explicit `[missing: <path>]` placeholder (logged at
    /// error level) instead of failing the whole view.
    pub fn resolve_lossy(&self, locale: Locale) -> ResolvedNode {
        match self.resolve_at(locale, "$", false) {
            Ok(node) => node,
            // Unreachable: the lossy walk substitutes placeholders.
            Err(err) => {
                error!("catalog resolution failed: {err}");
                ResolvedNode::Text(String::new())
            }
        }
    }

    fn resolve_at(&self, locale: Locale, path: &str, strict: bool) -> CatalogResult<ResolvedNode> {
        match self {
            ContentNode::Leaf(values) => {
                let value = values
                    .get(&locale)
                    .or_else(|| values.get(&DEFAULT_LOCALE));
                match value {
                    Some(LeafValue::Text(s)) => Ok(ResolvedNode::Text(s.clone())),
                    Some(LeafValue::List(items)) => Ok(ResolvedNode::List(items.clone())),
                    None if strict => Err(CatalogError::MissingLocaleData {
                        path: path.to_string(),
                    }),
                    None => {
                        error!("no value for '{locale}' or '{DEFAULT_LOCALE}' at '{path}'");
                        if values.values().next().is_some_and(LeafValue::is_list) {
                            Ok(ResolvedNode::List(Vec::new()))
                        } else {
                            Ok(ResolvedNode::Text(format!("[missing: {path}]")))
                        }
                    }
                }
            }
            ContentNode::Branch(children) => {
                let mut resolved = BTreeMap::new();
                for (key, child) in children {
                    let child_path = format!("{path}.{key}");
                    resolved.insert(key.clone(), child.resolve_at(locale, &child_path, strict)?);
                }
                Ok(ResolvedNode::Map(resolved))
            }
            ContentNode::Sequence(children) => {
                let mut resolved = Vec::with_capacity(children.len());
                for (idx, child) in children.iter().enumerate() {
                    let child_path = format!("{path}[{idx}]");
                    resolved.push(child.resolve_at(locale, &child_path, strict)?);
                }
                Ok(ResolvedNode::Seq(resolved))
            }
        }
    }
}

/// A locale-specific view of the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedNode {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, ResolvedNode>),
    Seq(Vec<ResolvedNode>),
}

impl ResolvedNode {
    /// Walk a dotted path ("soundboard.categories.needs.title"). Numeric
    /// segments index into sequences.
    pub fn get(&self, path: &str) -> Option<&ResolvedNode> {
        let mut node = self;
        for segment in path.split('.') {
            node = match node {
                ResolvedNode::Map(children) => children.get(segment)?,
                ResolvedNode::Seq(children) => {
                    children.get(segment.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
        }
        Some(node)
    }

    /// The text at `path`, if it resolves to a string.
    pub fn text(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            ResolvedNode::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The string list at `path`, if it resolves to one.
    pub fn list(&self, path: &str) -> Option<&[String]> {
        match self.get(path)? {
            ResolvedNode::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Child keys at `path`, in deterministic order.
    pub fn keys(&self, path: &str) -> Vec<String> {
        match self.get(path) {
            Some(ResolvedNode::Map(children)) => children.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

fn leaf_shaped_value(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(items) => items.iter().all(|v| v.is_string()),
        _ => false,
    }
}
