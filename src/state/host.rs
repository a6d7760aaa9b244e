//! Type system host — owns the sources and publishes model generations.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::base::{FileId, ModuleId};
use crate::config::ModelConfig;
use crate::decl::{adapt_file, adapt_files, DeclarationGroup, RawFile, SourceSet};
use crate::error::RebuildError;
use crate::meta::{build_model, GlobalTypeModel};

/// Called with each newly published generation.
pub type ChangeListener = Box<dyn Fn(&Arc<GlobalTypeModel>) + Send + Sync>;

/// Whether a rebuild is currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    /// The published generation is current as far as the host knows.
    Stable,
    /// A new generation is being computed; readers still see the old one.
    Rebuilding,
}

/// What a call to [`TypeSystemHost::rebuild`] achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// A new generation was published.
    Published { generation: u64 },
    /// The published generation already reflects the current sources.
    UpToDate { generation: u64 },
    /// Another rebuild holds the build lock and covers this request.
    Coalesced,
}

/// Project-scoped owner of the declaration sources and the published model.
///
/// Readers call [`snapshot`](Self::snapshot) and work against that
/// generation for as long as they like; publication swaps an `Arc` and never
/// touches a model a reader holds. Edits bump the source revision and cancel
/// the running rebuild, whose result is then discarded.
pub struct TypeSystemHost {
    config: Arc<ModelConfig>,
    sources: RwLock<SourceSet>,
    model: RwLock<Arc<GlobalTypeModel>>,
    /// Bumped on every effective change to the sources.
    revision: AtomicU64,
    /// Generation of the published model.
    generation: AtomicU64,
    /// Held for the duration of one build.
    build_lock: Mutex<()>,
    /// A rebuild was requested, or sources changed, while building.
    pending: AtomicBool,
    cancel: Mutex<CancellationToken>,
    listeners: RwLock<Vec<ChangeListener>>,
}

impl Default for TypeSystemHost {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl std::fmt::Debug for TypeSystemHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSystemHost")
            .field("revision", &self.revision())
            .field("generation", &self.generation())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl TypeSystemHost {
    pub fn new(config: ModelConfig) -> Self {
        let config = Arc::new(config);
        Self {
            model: RwLock::new(Arc::new(GlobalTypeModel::empty(config.clone()))),
            config,
            sources: RwLock::new(SourceSet::new()),
            revision: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            build_lock: Mutex::new(()),
            pending: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    // ===== reads =====

    /// The current published generation.
    pub fn snapshot(&self) -> Arc<GlobalTypeModel> {
        self.model.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ModelState {
        if self.build_lock.is_locked() {
            ModelState::Rebuilding
        } else {
            ModelState::Stable
        }
    }

    /// Whether the published generation lags behind the sources.
    pub fn is_stale(&self) -> bool {
        self.snapshot().revision() != self.revision()
    }

    /// Run `f` against the current source set.
    pub fn with_sources<R>(&self, f: impl FnOnce(&SourceSet) -> R) -> R {
        f(&self.sources.read())
    }

    // ===== edits =====

    pub fn register_module(&self, name: &str, custom: bool) -> ModuleId {
        self.sources.write().register_module(name, custom)
    }

    pub fn file_id(&self, path: &str) -> FileId {
        self.sources.write().file_id(path)
    }

    /// Replace one file's declarations. Returns whether anything changed.
    pub fn set_file(&self, file: &RawFile) -> bool {
        let mut sources = self.sources.write();
        let module = sources.register_module(&file.module, file.custom);
        let id = sources.file_id(&file.path);
        let group = adapt_file(id, module, &file.declarations);
        let changed = sources.set_group(group);
        if changed {
            self.note_change();
        }
        changed
    }

    /// Replace many files at once; adaptation runs in parallel.
    /// Returns how many files changed.
    pub fn set_files(&self, files: &[RawFile]) -> usize {
        let mut sources = self.sources.write();
        let groups = adapt_files(&mut sources, files);
        let changed = groups
            .into_iter()
            .map(|group| sources.set_group(group))
            .filter(|&changed| changed)
            .count();
        if changed > 0 {
            self.note_change();
        }
        changed
    }

    /// Replace a file's group with an already adapted one.
    pub fn set_group(&self, group: DeclarationGroup) -> bool {
        let mut sources = self.sources.write();
        let changed = sources.set_group(group);
        if changed {
            self.note_change();
        }
        changed
    }

    pub fn remove_file(&self, path: &str) -> bool {
        let mut sources = self.sources.write();
        let Some(file) = sources.lookup_file(path) else {
            return false;
        };
        let changed = sources.remove_file(file);
        if changed {
            self.note_change();
        }
        changed
    }

    /// Called with the sources write lock held.
    fn note_change(&self) {
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        self.pending.store(true, Ordering::Release);
        self.cancel.lock().cancel();
        debug!(revision, "declarations changed");
    }

    // ===== listeners =====

    /// Register a "model changed" listener.
    pub fn subscribe(&self, listener: impl Fn(&Arc<GlobalTypeModel>) + Send + Sync + 'static) {
        self.listeners.write().push(Box::new(listener));
    }

    // ===== rebuild =====

    /// Rebuild on a rayon worker.
    pub fn schedule_rebuild(self: &Arc<Self>) {
        let host = Arc::clone(self);
        rayon::spawn(move || {
            if let Err(err) = host.rebuild() {
                debug!(%err, "scheduled rebuild dropped");
            }
        });
    }

    /// Bring the published model up to date with the sources.
    ///
    /// At most one rebuild runs at a time. A request that finds a rebuild in
    /// progress returns [`RebuildOutcome::Coalesced`] at once; the running
    /// rebuild then performs exactly one more pass before returning, no
    /// matter how many requests or edits arrived meanwhile. A pass discarded
    /// because of a newer edit is never reported as an error: whoever holds
    /// the build lock next absorbs it.
    #[tracing::instrument(level = "debug", skip_all, fields(revision = self.revision()))]
    pub fn rebuild(&self) -> Result<RebuildOutcome, RebuildError> {
        let Some(guard) = self.build_lock.try_lock() else {
            self.pending.store(true, Ordering::Release);
            debug!("rebuild coalesced");
            return Ok(RebuildOutcome::Coalesced);
        };
        let outcome = self.rebuild_locked();
        drop(guard);
        self.drain_pending(outcome)
    }

    /// Run the passes requested between the last pass and unlock.
    fn drain_pending(
        &self,
        mut outcome: Result<RebuildOutcome, RebuildError>,
    ) -> Result<RebuildOutcome, RebuildError> {
        while self.pending.load(Ordering::Acquire) {
            let Some(guard) = self.build_lock.try_lock() else {
                // the current holder picks up `pending`
                return Ok(RebuildOutcome::Coalesced);
            };
            outcome = self.rebuild_locked();
            drop(guard);
        }
        match outcome {
            Ok(outcome) => Ok(outcome),
            Err(RebuildError::Superseded) => {
                debug!("superseded pass absorbed by a newer rebuild");
                Ok(RebuildOutcome::Coalesced)
            }
        }
    }

    fn rebuild_locked(&self) -> Result<RebuildOutcome, RebuildError> {
        let mut outcome = self.build_once();
        // one follow-up pass absorbs everything that arrived meanwhile
        if self.pending.load(Ordering::Acquire) {
            outcome = self.build_once();
        }
        outcome
    }

    fn build_once(&self) -> Result<RebuildOutcome, RebuildError> {
        self.pending.store(false, Ordering::Release);
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        let (groups, revision) = {
            let sources = self.sources.read();
            (
                sources.groups_in_merge_order(self.config.merge_order),
                self.revision(),
            )
        };

        let previous = self.snapshot();
        if previous.revision() == revision && previous.generation() > 0 {
            return Ok(RebuildOutcome::UpToDate {
                generation: previous.generation(),
            });
        }

        let started = Instant::now();
        let generation = self.generation() + 1;
        let model = build_model(
            &groups,
            self.config.clone(),
            Some(&previous),
            generation,
            revision,
            &token,
        )?;
        let model = Arc::new(model);
        self.publish(model.clone(), &token)?;

        info!(
            generation,
            revision,
            nodes = model.len(),
            diagnostics = model.diagnostics().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "type model published"
        );
        for listener in self.listeners.read().iter() {
            listener(&model);
        }
        Ok(RebuildOutcome::Published { generation })
    }

    /// Swap in `model` unless a newer change superseded it.
    fn publish(&self, model: Arc<GlobalTypeModel>, token: &CancellationToken) -> Result<(), RebuildError> {
        let mut slot = self.model.write();
        if token.is_cancelled() || self.revision() != model.revision() {
            debug!(revision = model.revision(), "discarding superseded model");
            return Err(RebuildError::Superseded);
        }
        self.generation.store(model.generation(), Ordering::Release);
        *slot = model;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::decl::{RawAttribute, RawDeclaration};

    fn file(path: &str, decls: Vec<RawDeclaration>) -> RawFile {
        RawFile {
            path: path.to_string(),
            module: "core".to_string(),
            custom: false,
            declarations: decls,
        }
    }

    #[test]
    fn test_initial_state() {
        let host = TypeSystemHost::default();
        assert_eq!(host.generation(), 0);
        assert_eq!(host.state(), ModelState::Stable);
        assert!(host.snapshot().is_empty());
    }

    #[test]
    fn test_rebuild_publishes_new_generation() {
        let host = TypeSystemHost::default();
        host.set_file(&file("/core-items.xml", vec![RawDeclaration::item("Product", None)]));

        assert!(host.is_stale());
        assert_eq!(host.rebuild(), Ok(RebuildOutcome::Published { generation: 1 }));
        assert_eq!(host.generation(), 1);
        assert!(host.snapshot().access().find_type_by_code("Product").is_some());
        assert!(!host.is_stale());

        assert_eq!(host.rebuild(), Ok(RebuildOutcome::UpToDate { generation: 1 }));
    }

    #[test]
    fn test_unchanged_file_is_not_a_change() {
        let host = TypeSystemHost::default();
        let items = file("/core-items.xml", vec![RawDeclaration::item("Product", None)]);

        assert!(host.set_file(&items));
        let revision = host.revision();
        assert!(!host.set_file(&items));
        assert_eq!(host.revision(), revision);
    }

    #[test]
    fn test_request_during_rebuild_is_coalesced() {
        let host = TypeSystemHost::default();
        let guard = host.build_lock.lock();

        assert_eq!(host.state(), ModelState::Rebuilding);
        assert_eq!(host.rebuild(), Ok(RebuildOutcome::Coalesced));
        assert!(host.pending.load(Ordering::Acquire));
        drop(guard);
    }

    #[test]
    fn test_superseded_model_is_discarded() {
        let host = TypeSystemHost::default();
        host.set_file(&file("/a.xml", vec![RawDeclaration::item("Product", None)]));

        let token = CancellationToken::new();
        *host.cancel.lock() = token.clone();
        let groups = host.with_sources(|s| s.groups_in_merge_order(host.config.merge_order));
        let candidate = build_model(&groups, host.config.clone(), None, 1, host.revision(), &token)
            .expect("build");

        // an edit lands before publication
        host.set_file(&file("/b.xml", vec![RawDeclaration::item("Category", None)]));

        assert_eq!(host.publish(Arc::new(candidate), &token), Err(RebuildError::Superseded));
        assert_eq!(host.generation(), 0);
        assert!(host.snapshot().is_empty());
    }

    #[test]
    fn test_superseded_pass_is_not_returned() {
        let host = TypeSystemHost::default();

        // another rebuild holds the lock and will see `pending`
        let guard = host.build_lock.lock();
        host.pending.store(true, Ordering::Release);
        assert_eq!(host.drain_pending(Err(RebuildError::Superseded)), Ok(RebuildOutcome::Coalesced));
        drop(guard);

        // nobody else is building: the pending edit gets its own pass
        host.set_file(&file("/a.xml", vec![RawDeclaration::item("Product", None)]));
        assert_eq!(
            host.drain_pending(Err(RebuildError::Superseded)),
            Ok(RebuildOutcome::Published { generation: 1 })
        );
        assert!(!host.is_stale());
    }

    #[test]
    fn test_changes_during_rebuild_trigger_exactly_one_follow_up() {
        let host = Arc::new(TypeSystemHost::default());
        let published = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&host);
        let counter = published.clone();
        host.subscribe(move |_| {
            let first = counter.fetch_add(1, Ordering::AcqRel) == 0;
            let Some(host) = weak.upgrade() else { return };
            if first {
                // still inside the first build: all of these coalesce
                host.set_file(&file("/b.xml", vec![RawDeclaration::item("Category", None)]));
                assert_eq!(host.rebuild(), Ok(RebuildOutcome::Coalesced));
                host.set_file(&file("/c.xml", vec![RawDeclaration::item("Media", None)]));
                assert_eq!(host.rebuild(), Ok(RebuildOutcome::Coalesced));
            }
        });

        host.set_file(&file("/a.xml", vec![RawDeclaration::item("Product", None)]));
        assert_eq!(host.rebuild(), Ok(RebuildOutcome::Published { generation: 2 }));

        assert_eq!(published.load(Ordering::Acquire), 2);
        let model = host.snapshot();
        assert_eq!(model.len(), 3);
        assert_eq!(model.revision(), host.revision());
    }

    #[test]
    fn test_listener_sees_published_generation() {
        let host = TypeSystemHost::default();
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        host.subscribe(move |model| sink.store(model.generation(), Ordering::Release));

        host.set_file(&file(
            "/a.xml",
            vec![RawDeclaration::item("Product", None).with_attribute(RawAttribute::new("code", "java.lang.String"))],
        ));
        host.rebuild().expect("rebuild");

        assert_eq!(seen.load(Ordering::Acquire), 1);
    }

    #[test]
    fn test_remove_file() {
        let host = TypeSystemHost::default();
        host.set_file(&file("/a.xml", vec![RawDeclaration::item("Product", None)]));
        host.rebuild().expect("rebuild");

        assert!(host.remove_file("/a.xml"));
        assert!(!host.remove_file("/a.xml"));
        host.rebuild().expect("rebuild");
        assert!(host.snapshot().access().find_type_by_code("Product").is_none());
    }
}
