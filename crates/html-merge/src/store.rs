/*
 * store.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template sources and caching.
//!
//! Raw template text comes from a [`TemplateSource`]. A [`TemplateCache`]
//! loads each template id once and merges the cached text on every render.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::array::{Collection, render_each};
use crate::error::{MergeError, MergeResult};
use crate::merge::merge;
use crate::value::Variables;

/// Trait for loading raw templates by id.
pub trait TemplateSource {
    /// Load the template text for `id`, or `None` if the source has no such
    /// template.
    fn load(&self, id: &str) -> MergeResult<Option<String>>;
}

/// Source that serves templates from an in-memory map.
///
/// Useful for testing and for templates bundled into the application.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template to the source.
    pub fn add(&mut self, id: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.templates.insert(id.into(), text.into());
        self
    }

    /// Create a source with the given templates.
    pub fn with_templates(
        templates: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut source = Self::new();
        for (id, text) in templates {
            source.add(id, text);
        }
        source
    }
}

impl TemplateSource for MemorySource {
    fn load(&self, id: &str) -> MergeResult<Option<String>> {
        Ok(self.templates.get(id).cloned())
    }
}

/// Source that reads templates from files under a root directory.
///
/// An id without an extension gets the source's default extension (`html`
/// unless changed with [`DirectorySource::with_extension`]).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "html".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The file a template id maps to.
    pub fn path_for(&self, id: &str) -> PathBuf {
        let path = self.root.join(id);
        if Path::new(id).extension().is_some() || self.extension.is_empty() {
            path
        } else {
            path.with_extension(&self.extension)
        }
    }
}

impl TemplateSource for DirectorySource {
    fn load(&self, id: &str) -> MergeResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(id)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Loads each template once and renders from the cached text.
#[derive(Debug)]
pub struct TemplateCache<S> {
    source: S,
    templates: Mutex<HashMap<String, Arc<str>>>,
}

impl<S: TemplateSource> TemplateCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            templates: Mutex::new(HashMap::new()),
        }
    }

    /// The raw text of template `id`, loading it on first use.
    pub fn raw(&self, id: &str) -> MergeResult<Arc<str>> {
        if let Some(text) = self.lock().get(id) {
            tracing::trace!(template = id, "template cache hit");
            return Ok(Arc::clone(text));
        }

        let text: Arc<str> = self
            .source
            .load(id)?
            .ok_or_else(|| MergeError::TemplateNotFound {
                name: id.to_string(),
            })?
            .into();
        tracing::debug!(template = id, bytes = text.len(), "template loaded");

        self.lock().insert(id.to_string(), Arc::clone(&text));
        Ok(text)
    }

    /// Merge `variables` into template `id`.
    pub async fn render(&self, id: &str, variables: &Variables, spacer: &str) -> MergeResult<String> {
        let raw = self.raw(id)?;
        Ok(merge(&raw, variables, spacer).await)
    }

    /// Render template `id` once per element of `collection`.
    pub async fn render_each(
        &self,
        id: &str,
        collection: &Collection,
        spacer: &str,
    ) -> MergeResult<String> {
        let raw = self.raw(id)?;
        Ok(render_each(&raw, collection, spacer).await)
    }

    /// Drop the cached text for `id`. Returns whether it was cached.
    pub fn invalidate(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<str>>> {
        self.templates.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts loads so caching can be observed.
    struct CountingSource {
        inner: MemorySource,
        loads: AtomicUsize,
    }

    impl TemplateSource for CountingSource {
        fn load(&self, id: &str) -> MergeResult<Option<String>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(id)
        }
    }

    #[test]
    fn test_path_for_default_extension() {
        let source = DirectorySource::new("/templates");
        assert_eq!(source.path_for("header"), PathBuf::from("/templates/header.html"));
        assert_eq!(source.path_for("menu/list"), PathBuf::from("/templates/menu/list.html"));
        assert_eq!(source.path_for("title.txt"), PathBuf::from("/templates/title.txt"));
    }

    #[test]
    fn test_path_for_custom_extension() {
        let source = DirectorySource::new("/t").with_extension("tpl");
        assert_eq!(source.path_for("card"), PathBuf::from("/t/card.tpl"));
        let bare = DirectorySource::new("/t").with_extension("");
        assert_eq!(bare.path_for("card"), PathBuf::from("/t/card"));
    }

    #[test]
    fn test_directory_source_missing_file() {
        let source = DirectorySource::new("/nonexistent-template-root");
        assert!(source.load("header").unwrap().is_none());
    }

    #[test]
    fn test_memory_source() {
        let source = MemorySource::with_templates([("a", "content a"), ("b", "content b")]);
        assert_eq!(source.load("a").unwrap(), Some("content a".to_string()));
        assert_eq!(source.load("missing").unwrap(), None);
    }

    #[test]
    fn test_cache_loads_once() {
        let cache = TemplateCache::new(CountingSource {
            inner: MemorySource::with_templates([("greeting", "Hello {name}!")]),
            loads: AtomicUsize::new(0),
        });
        let vars = Variables::new().with("name", "World");

        for _ in 0..3 {
            let out = pollster::block_on(cache.render("greeting", &vars, "")).unwrap();
            assert_eq!(out, "Hello World!");
        }
        assert_eq!(cache.source.loads.load(Ordering::SeqCst), 1);

        assert!(cache.invalidate("greeting"));
        assert!(!cache.invalidate("greeting"));
        cache.raw("greeting").unwrap();
        assert_eq!(cache.source.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_missing_template() {
        let cache = TemplateCache::new(MemorySource::new());
        let err = cache.raw("nope").unwrap_err();
        assert!(matches!(err, MergeError::TemplateNotFound { name } if name == "nope"));
    }
}
