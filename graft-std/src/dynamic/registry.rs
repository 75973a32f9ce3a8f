//! The live dispatch registry.
//!
//! Routes are held in an immutable [`RouteTable`] published through
//! [`ArcSwap`]. Readers take a snapshot with a single atomic load and never
//! block. Writers serialize on a mutex, copy the table, apply their change and
//! publish the new table with one `store`, so a reader sees either the old
//! table or the new one and never a half-built entry.

use crate::routing::{MethodFilter, PathPattern};
use arc_swap::ArcSwap;
use graft_core::{DynHandler, Handler, PatternError, RegistrationError, Request, Router};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

/// A pattern, a method set and the handler they resolve to.
#[derive(Clone)]
pub struct RouteEntry {
    pattern: PathPattern,
    methods: MethodFilter,
    handler: Arc<dyn DynHandler>,
}

impl RouteEntry {
    /// Create an entry accepting `methods` on `pattern`.
    pub fn new<H: Handler>(
        pattern: &str,
        methods: MethodFilter,
        handler: H,
    ) -> Result<Self, PatternError> {
        Ok(Self::from_arc(PathPattern::parse(pattern)?, methods, Arc::new(handler)))
    }

    /// Create an entry from an already shared handler.
    pub fn from_arc(
        pattern: PathPattern,
        methods: MethodFilter,
        handler: Arc<dyn DynHandler>,
    ) -> Self {
        Self {
            pattern,
            methods,
            handler,
        }
    }

    /// The URL pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The accepted methods.
    pub fn methods(&self) -> MethodFilter {
        self.methods
    }

    /// The handler.
    pub fn handler(&self) -> &Arc<dyn DynHandler> {
        &self.handler
    }

    fn same_mapping(&self, other: &RouteEntry) -> bool {
        self.methods == other.methods && self.pattern.as_str() == other.pattern.as_str()
    }

    fn matches(&self, request: &Request) -> bool {
        self.methods.accepts(request.method()) && self.pattern.matches(request.path())
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// One published version of the route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    revision: u64,
}

impl RouteTable {
    /// Entries in match order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Revision this table was published at.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The first entry matching `request`.
    pub fn find(&self, request: &Request) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.matches(request))
    }

    /// Entries whose pattern is exactly `pattern`.
    pub fn with_pattern<'a>(&'a self, pattern: &'a str) -> impl Iterator<Item = &'a RouteEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.pattern.as_str() == pattern)
    }
}

/// The live mapping from URL pattern to handler.
///
/// Lookup is first-match-wins over registration order. Registering an entry
/// with the same pattern and method set as an existing one replaces it in
/// place, so the newer handler shadows the older one. Entries are never
/// removed.
pub struct DispatchRegistry {
    table: ArcSwap<RouteTable>,
    writer: Mutex<()>,
    revision: AtomicU64,
    sealed: AtomicBool,
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RouteTable::default()),
            writer: Mutex::new(()),
            revision: AtomicU64::new(0),
            sealed: AtomicBool::new(false),
        }
    }

    /// Add or replace a route.
    ///
    /// Returns [`RegistrationError::Denied`] once the registry is sealed.
    pub fn register(&self, entry: RouteEntry) -> Result<(), RegistrationError> {
        let _guard = self.writer.lock();
        if self.sealed.load(Ordering::Acquire) {
            return Err(RegistrationError::Denied(format!(
                "dispatch registry is sealed, cannot map `{}`",
                entry.pattern
            )));
        }

        let current = self.table.load();
        let mut entries = current.entries.clone();
        match entries.iter_mut().find(|existing| existing.same_mapping(&entry)) {
            Some(existing) => {
                tracing::warn!(pattern = %entry.pattern, "Route mapping replaced");
                *existing = entry;
            }
            None => {
                tracing::debug!(pattern = %entry.pattern, methods = ?entry.methods, "Route mapped");
                entries.push(entry);
            }
        }

        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        self.table.store(Arc::new(RouteTable { entries, revision }));
        Ok(())
    }

    /// The current table. The snapshot stays valid while held, even if the
    /// registry is mutated concurrently.
    pub fn snapshot(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Number of successful mutations so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Refuse all further mutation.
    pub fn seal(&self) {
        let _guard = self.writer.lock();
        self.sealed.store(true, Ordering::Release);
    }

    /// Whether the registry refuses mutation.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

impl Router for DispatchRegistry {
    fn lookup(&self, request: &Request) -> Option<Arc<dyn DynHandler>> {
        let table = self.table.load();
        table.find(request).map(|entry| Arc::clone(&entry.handler))
    }
}

impl fmt::Debug for DispatchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field("routes", &self.table.load().len())
            .field("revision", &self.revision())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_core::{Method, Response, handler::from_fn};

    async fn body_of(registry: &DispatchRegistry, request: Request) -> Option<Vec<u8>> {
        let handler = registry.lookup(&request)?;
        let mut response = Response::new();
        handler.call_dyn(&request, &mut response).await.unwrap();
        Some(response.body().to_vec())
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = DispatchRegistry::new();
        registry
            .register(RouteEntry::new("/ping", MethodFilter::GET, from_fn(|_: &Request| "pong")).unwrap())
            .unwrap();

        assert_eq!(body_of(&registry, Request::get("/ping")).await, Some(b"pong".to_vec()));
        assert!(registry.lookup(&Request::new(Method::POST, "/ping")).is_none());
        assert!(registry.lookup(&Request::get("/missing")).is_none());
        assert_eq!(registry.revision(), 1);
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let registry = DispatchRegistry::new();
        registry
            .register(RouteEntry::new("/a/*", MethodFilter::ANY, from_fn(|_: &Request| "wild")).unwrap())
            .unwrap();
        registry
            .register(RouteEntry::new("/a/b", MethodFilter::ANY, from_fn(|_: &Request| "exact")).unwrap())
            .unwrap();

        assert_eq!(body_of(&registry, Request::get("/a/b")).await, Some(b"wild".to_vec()));
    }

    #[tokio::test]
    async fn test_same_mapping_shadows_in_place() {
        let registry = DispatchRegistry::new();
        registry
            .register(RouteEntry::new("/evilcontroller", MethodFilter::ANY, from_fn(|_: &Request| "old")).unwrap())
            .unwrap();
        registry
            .register(RouteEntry::new("/evilcontroller", MethodFilter::ANY, from_fn(|_: &Request| "new")).unwrap())
            .unwrap();

        let table = registry.snapshot();
        assert_eq!(table.with_pattern("/evilcontroller").count(), 1);
        assert_eq!(
            body_of(&registry, Request::get("/evilcontroller")).await,
            Some(b"new".to_vec())
        );
    }

    #[test]
    fn test_snapshot_is_stable() {
        let registry = DispatchRegistry::new();
        let before = registry.snapshot();
        registry
            .register(RouteEntry::new("/x", MethodFilter::ANY, from_fn(|_: &Request| "")).unwrap())
            .unwrap();
        assert!(before.is_empty());
        assert_eq!(registry.snapshot().len(), 1);
        assert_eq!(registry.snapshot().revision(), 1);
    }

    #[test]
    fn test_sealed_registry_denies() {
        let registry = DispatchRegistry::new();
        registry.seal();
        let result =
            registry.register(RouteEntry::new("/x", MethodFilter::ANY, from_fn(|_: &Request| "")).unwrap());
        assert!(matches!(result, Err(RegistrationError::Denied(_))));
        assert_eq!(registry.revision(), 0);
    }
}
