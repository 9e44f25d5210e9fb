//! Shell controller: onboarding gate wrapped around view navigation.
//!
//! # Responsibility
//! - Run the startup sequence and decide who owns the screen.
//! - Keep at most one normal panel mounted, tearing it down on navigation.
//! - Keep the persistent panel mounted for the shell's whole lifetime.
//! - Drive deferred loads and apply their results through the event queue.
//!
//! # Invariants
//! - Every state transition happens under `&mut self`; no two interleave.
//! - The persistent panel is built once in `start` and dropped with the shell.
//! - Navigating away from a loading panel never cancels its load.
//! - Navigation is suppressed while onboarding owns the screen.

pub mod events;
pub mod navigation;
pub mod onboarding;
pub mod persistent;
pub mod render;
pub mod startup;

pub use events::{FlagToggle, Navigator};
pub use navigation::{NavigationChange, NavigationController, NavigationError};
pub use onboarding::{OnboardingGate, ScreenOwner};
pub use persistent::PersistentView;
pub use render::{
    BackgroundFrame, Chrome, ContentFrame, Screen, WorkspaceFrame, LOADING_PLACEHOLDER,
};
pub use startup::ShellServices;

use crate::config::{ConfigError, ShellConfig};
use crate::debug_registry;
use crate::registry::{
    Layout, LoadFuture, LoadPhase, Panel, PanelContext, PanelFactory, PanelLoadError,
    RegistryError, Resolution, ViewRegistry,
};
use crate::store::{FeatureFlags, StoreError};
use crate::view::ViewId;
use events::ShellEvent;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Name under which the services handle is published in development mode.
pub const DEBUG_STORE_HANDLE: &str = "store";

#[derive(Debug)]
pub enum ShellError {
    Config(ConfigError),
    Registry(RegistryError),
    /// `start` was polled outside a tokio runtime.
    NoRuntime(String),
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::NoRuntime(message) => write!(f, "shell requires a tokio runtime: {message}"),
        }
    }
}

impl Error for ShellError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::NoRuntime(_) => None,
        }
    }
}

impl From<ConfigError> for ShellError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RegistryError> for ShellError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

struct MountedPanel {
    view: ViewId,
    instance_id: Uuid,
    panel: Box<dyn Panel>,
}

/// The application shell.
pub struct Shell {
    registry: ViewRegistry,
    services: ShellServices,
    navigation: NavigationController,
    gate: OnboardingGate,
    flags: FeatureFlags,
    flags_user_set: bool,
    persistent: PersistentView,
    active: Option<MountedPanel>,
    sender: UnboundedSender<ShellEvent>,
    receiver: UnboundedReceiver<ShellEvent>,
    runtime: Handle,
}

impl Shell {
    /// Runs the startup sequence and returns once the onboarding decision is
    /// known. Feature flags may still arrive later through the event queue.
    pub async fn start(
        config: &ShellConfig,
        registry: ViewRegistry,
        services: ShellServices,
    ) -> Result<Self, ShellError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|err| ShellError::NoRuntime(err.to_string()))?;
        let persistent_view = registry.persistent_view();
        let persistent_factory = match registry.resolve(persistent_view)? {
            Resolution::Ready(factory) => factory,
            _ => return Err(RegistryError::PersistentViewDeferred(persistent_view).into()),
        };

        let (sender, receiver) = mpsc::unbounded_channel();

        // Restoring the view is a synchronous key store read; it does not wait
        // on any of the startup reads below.
        let navigation = NavigationController::restore(
            Arc::clone(&services.key_store),
            config.active_view_key.as_str(),
            ViewId::ALL.into_iter().filter(|view| registry.contains(*view)),
            registry.default_view(),
        );

        debug_registry::expose(
            config.dev_mode,
            DEBUG_STORE_HANDLE,
            Arc::new(services.clone()),
        );

        let profile = startup::run_startup(&runtime, &services, sender.clone()).await;
        let gate = OnboardingGate::from_lookup(profile);

        let flags = FeatureFlags::default();
        let persistent_ctx = PanelContext {
            view: persistent_view,
            instance_id: Uuid::new_v4(),
            navigator: Navigator::new(sender.clone()),
            user_name: gate.profile().map(|profile| profile.name.clone()),
            flags,
            flag_toggle: None,
        };
        let persistent = PersistentView::construct(&persistent_factory, persistent_ctx);

        let mut shell = Self {
            registry,
            services,
            navigation,
            gate,
            flags,
            flags_user_set: false,
            persistent,
            active: None,
            sender,
            receiver,
            runtime,
        };
        if shell.owner() == ScreenOwner::Navigation {
            shell.mount_current();
        }
        shell.sync_visibility();

        info!(
            "event=shell_start module=shell status=ok owner={:?} current={}",
            shell.owner(),
            shell.current()
        );
        Ok(shell)
    }

    pub fn current(&self) -> ViewId {
        self.navigation.current()
    }

    pub fn owner(&self) -> ScreenOwner {
        self.gate.owner()
    }

    pub fn should_show_onboarding(&self) -> bool {
        self.gate.should_show_onboarding()
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn persistent_view(&self) -> &PersistentView {
        &self.persistent
    }

    /// View and instance id of the mounted normal panel, if any.
    pub fn active_instance(&self) -> Option<(ViewId, Uuid)> {
        self.active
            .as_ref()
            .map(|mounted| (mounted.view, mounted.instance_id))
    }

    /// Navigation writes the key store rejected since startup.
    pub fn persist_failures(&self) -> u64 {
        self.navigation.persist_failures()
    }

    pub fn load_phase(&self, view: ViewId) -> Option<LoadPhase> {
        self.registry.load_phase(view)
    }

    /// Navigation callback for hosts and panels outside the shell.
    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.sender.clone())
    }

    /// Registers a synchronous navigation subscriber.
    pub fn subscribe(&mut self, listener: impl FnMut(&NavigationChange) + 'static) {
        self.navigation.subscribe(listener);
    }

    /// Navigates to `target`, tearing down the previous normal panel.
    ///
    /// # Errors
    /// - `NavigationError::Suppressed` while onboarding owns the screen.
    /// - `NavigationError::NotRegistered` when `target` has no registry entry.
    pub fn navigate(&mut self, target: ViewId) -> Result<NavigationChange, NavigationError> {
        if self.owner() == ScreenOwner::Onboarding {
            warn!("event=navigate module=shell status=suppressed to={target}");
            return Err(NavigationError::Suppressed(target));
        }

        let change = self.navigation.navigate(target)?;
        if change.is_repeat() {
            self.refresh_current();
        } else {
            self.mount_current();
        }
        self.sync_visibility();
        Ok(change)
    }

    /// Navigates to a view named by its persisted token.
    pub fn navigate_token(&mut self, token: &str) -> Result<NavigationChange, NavigationError> {
        let target = token
            .parse::<ViewId>()
            .map_err(NavigationError::UnknownView)?;
        self.navigate(target)
    }

    /// Signals that the onboarding flow finished and wrote the profile.
    ///
    /// Returns `true` when the screen moved to navigation.
    pub async fn complete_onboarding(&mut self) -> bool {
        let profiles = Arc::clone(&self.services.profiles);
        let lookup = match self
            .runtime
            .spawn_blocking(move || profiles.get_profile())
            .await
        {
            Ok(result) => result,
            Err(err) => Err(StoreError::Unavailable(format!(
                "profile lookup worker failed: {err}"
            ))),
        };

        if !self.gate.apply_completion(lookup) {
            return false;
        }
        self.mount_current();
        self.sync_visibility();
        true
    }

    /// Explicit retry trigger for a deferred view whose load failed.
    ///
    /// Returns `false` unless the view was in the failed phase.
    pub fn retry_load(&mut self, view: ViewId) -> bool {
        match self.registry.retry(view) {
            Some(future) => {
                self.spawn_load(view, future);
                true
            }
            None => false,
        }
    }

    /// Applies every queued event without waiting. Returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Waits for the next queued event and applies it.
    pub async fn next_event(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Current render projection.
    pub fn render(&self) -> Screen {
        if self.owner() == ScreenOwner::Onboarding {
            return Screen::Onboarding;
        }

        let current = self.current();
        let content = if current == self.persistent.view() {
            ContentFrame::Background
        } else {
            match &self.active {
                Some(mounted) if mounted.view == current => ContentFrame::Panel {
                    view: current,
                    body: mounted.panel.render(),
                },
                _ => match self.registry.resolve(current) {
                    Ok(Resolution::Failed(err)) => ContentFrame::LoadFailed {
                        view: current,
                        reason: err.to_string(),
                    },
                    _ => ContentFrame::Loading(current),
                },
            }
        };

        let chrome = self
            .registry
            .entry(current)
            .filter(|entry| entry.layout() == Layout::Chrome)
            .map(|_| Chrome {
                sidebar: self.registry.sidebar_views(self.flags.alpha_enabled),
                user_name: self.gate.profile().map(|profile| profile.name.clone()),
                alpha_enabled: self.flags.alpha_enabled,
            });

        Screen::Workspace(WorkspaceFrame {
            current,
            content,
            background: BackgroundFrame {
                view: self.persistent.view(),
                visible: self.persistent.is_visible(),
                body: self.persistent.render(),
            },
            chrome,
        })
    }

    fn apply(&mut self, event: ShellEvent) {
        debug!("event=shell_event module=shell status=apply kind={}", event.name());
        match event {
            ShellEvent::Navigate(view) => {
                if let Err(err) = self.navigate(view) {
                    warn!("event=panel_navigate module=shell status=error error={err}");
                }
            }
            ShellEvent::SetAlphaEnabled(enabled) => self.set_alpha_enabled(enabled),
            ShellEvent::FlagsResolved(flags) => {
                if self.flags_user_set {
                    debug!("event=feature_flags module=shell status=ignored reason=user_set");
                } else {
                    self.apply_flags(flags);
                }
            }
            ShellEvent::LoadFinished { view, result } => self.finish_load(view, result),
        }
    }

    fn set_alpha_enabled(&mut self, enabled: bool) {
        self.flags_user_set = true;
        self.apply_flags(FeatureFlags {
            alpha_enabled: enabled,
        });

        let Some(store) = self.services.flags.clone() else {
            return;
        };
        let write = self
            .runtime
            .spawn_blocking(move || store.set_alpha_enabled(enabled));
        self.runtime.spawn(async move {
            match write.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(
                    "event=feature_flags_persist module=shell status=error alpha_enabled={enabled} error={err}"
                ),
                Err(err) => warn!(
                    "event=feature_flags_persist module=shell status=error alpha_enabled={enabled} error={err}"
                ),
            }
        });
    }

    fn apply_flags(&mut self, flags: FeatureFlags) {
        if self.flags == flags {
            return;
        }
        self.flags = flags;
        info!(
            "event=feature_flags module=shell status=ok alpha_enabled={}",
            flags.alpha_enabled
        );
        self.persistent.flags_changed(flags);
        if let Some(mounted) = self.active.as_mut() {
            mounted.panel.on_flags_changed(flags);
        }
    }

    fn refresh_current(&mut self) {
        let current = self.current();
        if current == self.persistent.view() {
            self.persistent.refresh();
            return;
        }
        match self.active.as_mut() {
            Some(mounted) if mounted.view == current => mounted.panel.on_refresh(),
            _ => self.mount_current(),
        }
    }

    /// Makes the mounted normal panel match the current view.
    fn mount_current(&mut self) {
        let current = self.current();
        if self
            .active
            .as_ref()
            .is_some_and(|mounted| mounted.view == current)
        {
            return;
        }
        if let Some(previous) = self.active.take() {
            debug!(
                "event=panel_teardown module=shell status=ok view={} instance_id={}",
                previous.view, previous.instance_id
            );
        }
        if current == self.persistent.view() {
            return;
        }

        match self.registry.resolve(current) {
            Ok(Resolution::Ready(factory)) => self.build_active(current, &factory),
            Ok(Resolution::Pending(LoadPhase::Unloaded)) => {
                if let Some(future) = self.registry.activate(current) {
                    self.spawn_load(current, future);
                }
            }
            Ok(Resolution::Pending(_)) | Ok(Resolution::Failed(_)) => {}
            Err(err) => error!("event=panel_mount module=shell status=error error={err}"),
        }
    }

    fn build_active(&mut self, view: ViewId, factory: &PanelFactory) {
        let grants_flag_toggle = self
            .registry
            .entry(view)
            .is_some_and(|entry| entry.grants_flag_toggle());
        let ctx = PanelContext {
            view,
            instance_id: Uuid::new_v4(),
            navigator: Navigator::new(self.sender.clone()),
            user_name: self.gate.profile().map(|profile| profile.name.clone()),
            flags: self.flags,
            flag_toggle: grants_flag_toggle.then(|| FlagToggle::new(self.sender.clone())),
        };
        let instance_id = ctx.instance_id;
        let panel = factory(ctx);
        debug!("event=panel_mount module=shell status=ok view={view} instance_id={instance_id}");
        self.active = Some(MountedPanel {
            view,
            instance_id,
            panel,
        });
    }

    /// Runs a load on the runtime; the outcome comes back as an event even if
    /// the user has navigated elsewhere in the meantime.
    fn spawn_load(&self, view: ViewId, future: LoadFuture) {
        let sender = self.sender.clone();
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let result = match runtime.spawn(future).await {
                Ok(result) => result,
                Err(err) => Err(PanelLoadError::Aborted(err.to_string())),
            };
            let _ = sender.send(ShellEvent::LoadFinished { view, result });
        });
    }

    fn finish_load(&mut self, view: ViewId, result: Result<PanelFactory, PanelLoadError>) {
        let outcome = match &result {
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        };
        if !self.registry.complete(view, result) {
            debug!("event=deferred_load module=shell status=ignored view={view}");
            return;
        }
        match outcome {
            None => info!("event=deferred_load module=shell status=ok view={view}"),
            Some(err) => {
                warn!("event=deferred_load module=shell status=error view={view} error={err}")
            }
        }

        if self.owner() == ScreenOwner::Navigation && self.current() == view {
            self.mount_current();
        }
    }

    fn sync_visibility(&mut self) {
        let visible =
            self.owner() == ScreenOwner::Navigation && self.current() == self.persistent.view();
        self.persistent.set_visible(visible);
    }
}
