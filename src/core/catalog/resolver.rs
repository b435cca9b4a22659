//! Memoizing wrapper around catalog resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use super::node::{CatalogResult, ResolvedNode};
use super::Catalog;
use crate::core::locale::Locale;

/// Resolves the catalog to a locale view and caches the result per locale.
///
/// Resolution is pure and the catalog is immutable, so a cached view stays
/// valid for the lifetime of the resolver; switching locales simply reads
/// (or fills) a different cache slot. Views are `Arc`-shared, making
/// [`TranslationResolver::view`] cheap enough for render-rate callers.
pub struct TranslationResolver {
    catalog: Arc<Catalog>,
    cache: Mutex<HashMap<Locale, Arc<ResolvedNode>>>,
}

impl TranslationResolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The resolved view for `locale`. Unresolvable leaves degrade to
    /// explicit placeholders (logged) rather than failing the view.
    pub fn view(&self, locale: Locale) -> Arc<ResolvedNode> {
        let mut cache = self.cache.lock();
        cache
            .entry(locale)
            .or_insert_with(|| {
                debug!("resolving catalog view for '{locale}'");
                Arc::new(self.catalog.root().resolve_lossy(locale))
            })
            .clone()
    }

    /// Strict resolution: any leaf without the requested or default locale
    /// fails the whole call. Not cached.
    pub fn resolve_strict(&self, locale: Locale) -> CatalogResult<ResolvedNode> {
        self.catalog.root().resolve(locale)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}
