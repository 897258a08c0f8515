//! Template entity resolution with a request-scoped memo cache.
//!
//! [`TemplateResolver`] turns a parsed [`TemplateRef`] into the stored
//! [`TemplateEntity`] it points at, substituting the scope's designated
//! default version when the reference asks for the stable version.
//! Successful resolutions are memoized in a [`ResolutionCache`] keyed by
//! `(identifier, scope, version_label)` for the remainder of the request.
//!
//! The cache is an explicit value threaded through calls by `&mut`
//! reference, never a global: it is purely an optimization (correctness
//! never depends on a hit), is discarded at request end, and is never
//! shared across concurrent requests.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::core::{Scope, TemplateEntity, TemplateError, TemplateRef};
use crate::external::TemplateStore;

type CacheKey = (String, Scope, String);

/// Request-scoped memo of resolved template entities.
#[derive(Default)]
pub struct ResolutionCache {
    entries: HashMap<CacheKey, Arc<TemplateEntity>>,
}

impl ResolutionCache {
    /// An empty cache for a new request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct entities resolved so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves template references against the template store.
pub struct TemplateResolver<'a> {
    store: &'a dyn TemplateStore,
}

impl<'a> TemplateResolver<'a> {
    /// Wrap a template store.
    pub fn new(store: &'a dyn TemplateStore) -> Self {
        Self { store }
    }

    /// Resolve a reference to its stored entity.
    ///
    /// A `None` version label (stable) is first resolved to the scope's
    /// default version, so stable and explicit lookups of the same concrete
    /// version share a cache entry. Fails with
    /// [`TemplateError::TemplateNotFound`] when no entity matches.
    pub async fn resolve(
        &self,
        reference: &TemplateRef,
        cache: &mut ResolutionCache,
    ) -> anyhow::Result<Arc<TemplateEntity>> {
        let version_label = match &reference.version_label {
            Some(label) => label.clone(),
            None => self
                .store
                .get_default_version(&reference.identifier, reference.scope)
                .await
                .context("template store default-version lookup failed")?
                .ok_or_else(|| TemplateError::TemplateNotFound {
                    identifier: reference.identifier.clone(),
                    scope: reference.scope,
                    version_label: None,
                })?,
        };

        let key = (reference.identifier.clone(), reference.scope, version_label.clone());
        if let Some(hit) = cache.entries.get(&key) {
            tracing::debug!(
                identifier = %reference.identifier,
                version = %version_label,
                "template cache hit"
            );
            return Ok(Arc::clone(hit));
        }

        let entity = self
            .store
            .get_entity(&reference.identifier, reference.scope, &version_label)
            .await
            .context("template store entity lookup failed")?
            .ok_or_else(|| TemplateError::TemplateNotFound {
                identifier: reference.identifier.clone(),
                scope: reference.scope,
                version_label: reference.version_label.clone(),
            })?;
        tracing::debug!(
            identifier = %entity.identifier,
            version = %entity.version_label,
            scope = %entity.scope,
            "resolved template entity"
        );
        let entity = Arc::new(entity);
        cache.entries.insert(key, Arc::clone(&entity));
        Ok(entity)
    }
}
