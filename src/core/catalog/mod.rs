//! # Locale catalog
//!
//! The content tree behind every user-facing string: a nested structure
//! whose leaves hold one value per locale code. Nodes are classified as
//! leaf or branch **once, at construction time**; resolution is a plain
//! match on the tagged union, so a branch whose keys happen to coincide
//! with locale codes can never be misread mid-render.
//!
//! [`TranslationResolver`] memoizes the resolved view per locale so the
//! resolution cost is paid once per locale, not once per render.

mod node;
mod resolver;

use once_cell::sync::Lazy;

pub use node::{CatalogError, CatalogResult, ContentNode, LeafValue, ResolvedNode};
pub use resolver::TranslationResolver;

/// An immutable content tree plus its entry points.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: ContentNode,
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    Catalog::from_json_str(include_str!("../../../assets/catalog.json"))
        .expect("embedded catalog is well-formed")
});

impl Catalog {
    pub fn from_node(root: ContentNode) -> Self {
        Self { root }
    }

    /// Parse and classify a JSON content tree.
    pub fn from_json_str(source: &str) -> CatalogResult<Self> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        Ok(Self {
            root: ContentNode::from_json(&value)?,
        })
    }

    /// The catalog shipped with the crate (grid labels, soundboard
    /// categories, toast strings).
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn root(&self) -> &ContentNode {
        &self.root
    }
}
