//! Static view registry.
//!
//! # Responsibility
//! - Map each view identifier to the code that builds its panel.
//! - Own per-entry deferred load state for lazily loaded panels.
//!
//! # Invariants
//! - Exactly one entry is persistent, and it is eager.
//! - The configured default view is always registered.
//! - Entry ids are unique.

use crate::view::ViewId;
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod deferred;
pub mod panel;

pub use deferred::{
    panel_loader, DeferredLoadState, LoadFuture, LoadPhase, PanelLoadError, PanelLoader,
};
pub use panel::{panel_factory, Panel, PanelContext, PanelFactory};

/// How an entry's panel code becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Eager,
    Deferred,
}

/// Screen frame an entry renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Inside the sidebar + topbar frame.
    Chrome,
    /// Replaces the frame entirely.
    Fullscreen,
}

enum PanelSource {
    Eager(PanelFactory),
    Deferred(DeferredLoadState),
}

/// One registry row.
pub struct RegistryEntry {
    id: ViewId,
    source: PanelSource,
    layout: Layout,
    persistent: bool,
    experimental: bool,
    grants_flag_toggle: bool,
}

impl RegistryEntry {
    /// Entry whose factory is available immediately.
    pub fn eager(id: ViewId, factory: PanelFactory) -> Self {
        Self::with_source(id, PanelSource::Eager(factory))
    }

    /// Entry whose factory is loaded on first activation.
    pub fn deferred(id: ViewId, loader: PanelLoader) -> Self {
        Self::with_source(id, PanelSource::Deferred(DeferredLoadState::new(loader)))
    }

    fn with_source(id: ViewId, source: PanelSource) -> Self {
        Self {
            id,
            source,
            layout: Layout::Chrome,
            persistent: false,
            experimental: false,
            grants_flag_toggle: false,
        }
    }

    /// Marks the entry as the persistent background view.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn fullscreen(mut self) -> Self {
        self.layout = Layout::Fullscreen;
        self
    }

    /// Lists the entry in the sidebar only while alpha features are enabled.
    pub fn experimental(mut self) -> Self {
        self.experimental = true;
        self
    }

    /// Hands this entry's panels the feature flag setter.
    pub fn with_flag_toggle(mut self) -> Self {
        self.grants_flag_toggle = true;
        self
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn load_mode(&self) -> LoadMode {
        match self.source {
            PanelSource::Eager(_) => LoadMode::Eager,
            PanelSource::Deferred(_) => LoadMode::Deferred,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_experimental(&self) -> bool {
        self.experimental
    }

    pub fn grants_flag_toggle(&self) -> bool {
        self.grants_flag_toggle
    }
}

/// Result of resolving an entry's factory.
#[derive(Clone)]
pub enum Resolution {
    Ready(PanelFactory),
    /// Deferred entry that has not resolved yet (unloaded or loading).
    Pending(LoadPhase),
    Failed(PanelLoadError),
}

/// Registry construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateView(ViewId),
    MissingPersistentView,
    MultiplePersistentViews(ViewId, ViewId),
    PersistentViewDeferred(ViewId),
    DefaultViewNotRegistered(ViewId),
    DefaultViewPersistent(ViewId),
    NotRegistered(ViewId),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateView(view) => write!(f, "view already registered: {view}"),
            Self::MissingPersistentView => write!(f, "registry has no persistent view"),
            Self::MultiplePersistentViews(first, second) => write!(
                f,
                "registry has more than one persistent view: {first}, {second}"
            ),
            Self::PersistentViewDeferred(view) => {
                write!(f, "persistent view must be eager: {view}")
            }
            Self::DefaultViewNotRegistered(view) => {
                write!(f, "default view is not registered: {view}")
            }
            Self::DefaultViewPersistent(view) => {
                write!(f, "default view must be a normal view: {view}")
            }
            Self::NotRegistered(view) => write!(f, "view is not registered: {view}"),
        }
    }
}

impl Error for RegistryError {}

/// Collects entries before validation.
pub struct ViewRegistryBuilder {
    default_view: ViewId,
    entries: Vec<RegistryEntry>,
}

impl ViewRegistryBuilder {
    pub fn entry(mut self, entry: RegistryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn default_view(mut self, view: ViewId) -> Self {
        self.default_view = view;
        self
    }

    /// Validates the collected entries and freezes the registry.
    pub fn build(self) -> Result<ViewRegistry, RegistryError> {
        let mut entries = BTreeMap::new();
        let mut persistent_view: Option<ViewId> = None;

        for entry in self.entries {
            let id = entry.id;
            if entry.persistent {
                if let Some(existing) = persistent_view {
                    return Err(RegistryError::MultiplePersistentViews(existing, id));
                }
                if entry.load_mode() == LoadMode::Deferred {
                    return Err(RegistryError::PersistentViewDeferred(id));
                }
                persistent_view = Some(id);
            }
            if entries.insert(id, entry).is_some() {
                return Err(RegistryError::DuplicateView(id));
            }
        }

        let persistent_view = persistent_view.ok_or(RegistryError::MissingPersistentView)?;
        if !entries.contains_key(&self.default_view) {
            return Err(RegistryError::DefaultViewNotRegistered(self.default_view));
        }
        if self.default_view == persistent_view {
            return Err(RegistryError::DefaultViewPersistent(self.default_view));
        }

        Ok(ViewRegistry {
            entries,
            default_view: self.default_view,
            persistent_view,
        })
    }
}

/// Frozen identifier -> panel mapping.
pub struct ViewRegistry {
    entries: BTreeMap<ViewId, RegistryEntry>,
    default_view: ViewId,
    persistent_view: ViewId,
}

impl ViewRegistry {
    pub fn builder() -> ViewRegistryBuilder {
        ViewRegistryBuilder {
            default_view: ViewId::Dashboard,
            entries: Vec::new(),
        }
    }

    pub fn default_view(&self) -> ViewId {
        self.default_view
    }

    pub fn persistent_view(&self) -> ViewId {
        self.persistent_view
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.entries.contains_key(&view)
    }

    pub fn entry(&self, view: ViewId) -> Option<&RegistryEntry> {
        self.entries.get(&view)
    }

    /// Registered views in sidebar order, hiding experimental entries unless
    /// alpha features are on.
    pub fn sidebar_views(&self, alpha_enabled: bool) -> Vec<ViewId> {
        ViewId::ALL
            .iter()
            .copied()
            .filter(|view| {
                self.entries
                    .get(view)
                    .is_some_and(|entry| alpha_enabled || !entry.experimental)
            })
            .collect()
    }

    /// Resolves the factory for one view.
    pub fn resolve(&self, view: ViewId) -> Result<Resolution, RegistryError> {
        let entry = self
            .entries
            .get(&view)
            .ok_or(RegistryError::NotRegistered(view))?;
        Ok(match &entry.source {
            PanelSource::Eager(factory) => Resolution::Ready(Arc::clone(factory)),
            PanelSource::Deferred(state) => match state.phase() {
                LoadPhase::Ready => match state.factory() {
                    Some(factory) => Resolution::Ready(factory),
                    None => Resolution::Pending(LoadPhase::Ready),
                },
                LoadPhase::Failed => match state.failure() {
                    Some(err) => Resolution::Failed(err.clone()),
                    None => Resolution::Pending(LoadPhase::Failed),
                },
                phase => Resolution::Pending(phase),
            },
        })
    }

    /// Load phase of a deferred entry; `None` for eager or unknown views.
    pub fn load_phase(&self, view: ViewId) -> Option<LoadPhase> {
        self.deferred(view).map(DeferredLoadState::phase)
    }

    pub fn load_attempts(&self, view: ViewId) -> Option<u32> {
        self.deferred(view).map(DeferredLoadState::attempts)
    }

    /// Starts the first load of a deferred entry.
    pub fn activate(&mut self, view: ViewId) -> Option<LoadFuture> {
        let future = self.deferred_mut(view)?.activate();
        if future.is_some() {
            debug!("event=deferred_load module=registry status=start view={view}");
        }
        future
    }

    /// Restarts a failed load of a deferred entry.
    pub fn retry(&mut self, view: ViewId) -> Option<LoadFuture> {
        let future = self.deferred_mut(view)?.retry();
        if future.is_some() {
            debug!("event=deferred_load module=registry status=retry view={view}");
        }
        future
    }

    /// Records a load outcome; returns whether the entry changed phase.
    pub fn complete(&mut self, view: ViewId, result: Result<PanelFactory, PanelLoadError>) -> bool {
        self.deferred_mut(view)
            .is_some_and(|state| state.complete(result))
    }

    fn deferred(&self, view: ViewId) -> Option<&DeferredLoadState> {
        match &self.entries.get(&view)?.source {
            PanelSource::Deferred(state) => Some(state),
            PanelSource::Eager(_) => None,
        }
    }

    fn deferred_mut(&mut self, view: ViewId) -> Option<&mut DeferredLoadState> {
        match &mut self.entries.get_mut(&view)?.source {
            PanelSource::Deferred(state) => Some(state),
            PanelSource::Eager(_) => None,
        }
    }
}
