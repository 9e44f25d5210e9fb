#![allow(dead_code)]

use deskshell_core::store::{MemoryKeyStore, MemoryProfileStore};
use deskshell_core::{
    panel_factory, panel_loader, FeatureFlags, Panel, PanelContext, PanelFactory, PanelLoadError,
    RegistryEntry, Shell, ShellConfig, ShellServices, UserProfile, ViewId, ViewRegistry,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};

pub const KEY: &str = "active_page";

/// Counts panel constructions per view.
#[derive(Clone, Default)]
pub struct BuildLog {
    counts: Arc<Mutex<BTreeMap<ViewId, usize>>>,
}

impl BuildLog {
    pub fn record(&self, view: ViewId) {
        *self.counts.lock().unwrap().entry(view).or_default() += 1;
    }

    pub fn count(&self, view: ViewId) -> usize {
        self.counts.lock().unwrap().get(&view).copied().unwrap_or(0)
    }
}

/// Normal panel that renders its view, refresh count and flags.
pub struct LabelPanel {
    view: ViewId,
    refreshes: usize,
    flags: FeatureFlags,
}

impl Panel for LabelPanel {
    fn render(&self) -> String {
        format!(
            "{} refreshes={} alpha={}",
            self.view, self.refreshes, self.flags.alpha_enabled
        )
    }

    fn on_flags_changed(&mut self, flags: FeatureFlags) {
        self.flags = flags;
    }

    fn on_refresh(&mut self) {
        self.refreshes += 1;
    }
}

pub fn label_factory(log: BuildLog) -> PanelFactory {
    panel_factory(move |ctx: PanelContext| {
        log.record(ctx.view);
        LabelPanel {
            view: ctx.view,
            refreshes: 0,
            flags: ctx.flags,
        }
    })
}

/// Persistent panel with in-flight work it owns.
pub struct AssistantPanel {
    messages: Arc<AtomicUsize>,
    reply: Arc<Mutex<Option<String>>>,
    visible: bool,
}

impl Panel for AssistantPanel {
    fn render(&self) -> String {
        let reply = self.reply.lock().unwrap().clone();
        format!(
            "assistant messages={} reply={} visible={}",
            self.messages.load(Ordering::SeqCst),
            reply.unwrap_or_else(|| "pending".to_string()),
            self.visible
        )
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Slot through which a test hands the assistant its pending request.
pub type PendingReply = Arc<Mutex<Option<oneshot::Receiver<String>>>>;

pub fn assistant_factory(log: BuildLog, pending: PendingReply) -> PanelFactory {
    panel_factory(move |ctx: PanelContext| {
        log.record(ctx.view);
        let messages = Arc::new(AtomicUsize::new(1));
        let reply = Arc::new(Mutex::new(None));
        if let Some(receiver) = pending.lock().unwrap().take() {
            let messages = Arc::clone(&messages);
            let reply = Arc::clone(&reply);
            tokio::spawn(async move {
                if let Ok(text) = receiver.await {
                    *reply.lock().unwrap() = Some(text);
                    messages.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        AssistantPanel {
            messages,
            reply,
            visible: false,
        }
    })
}

/// Loader that waits for a permit, then resolves with `outcome`.
pub fn gated_loader(
    gate: Arc<Semaphore>,
    calls: Arc<AtomicUsize>,
    outcome: Result<(), &'static str>,
    log: BuildLog,
) -> deskshell_core::registry::PanelLoader {
    panel_loader(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(&gate);
        let log = log.clone();
        async move {
            let result: Result<PanelFactory, PanelLoadError> = match gate.acquire().await {
                Err(err) => Err(PanelLoadError::Aborted(err.to_string())),
                Ok(permit) => {
                    permit.forget();
                    match outcome {
                        Ok(()) => Ok(label_factory(log)),
                        Err(reason) => Err(PanelLoadError::Rejected(reason.to_string())),
                    }
                }
            };
            result
        }
    })
}

/// Registry used across tests: eager dashboard/help/servers, persistent
/// assistant, and the caller's entries.
pub fn registry_with(
    log: &BuildLog,
    pending: &PendingReply,
    extra: Vec<RegistryEntry>,
) -> ViewRegistry {
    let mut builder = ViewRegistry::builder()
        .entry(RegistryEntry::eager(ViewId::Dashboard, label_factory(log.clone())))
        .entry(RegistryEntry::eager(ViewId::Help, label_factory(log.clone())))
        .entry(RegistryEntry::eager(ViewId::Servers, label_factory(log.clone())).fullscreen())
        .entry(
            RegistryEntry::eager(
                ViewId::Assistant,
                assistant_factory(log.clone(), Arc::clone(pending)),
            )
            .persistent()
            .fullscreen(),
        );
    for entry in extra {
        builder = builder.entry(entry);
    }
    builder.build().expect("test registry should build")
}

pub fn eager_settings(log: &BuildLog) -> RegistryEntry {
    RegistryEntry::eager(ViewId::Settings, label_factory(log.clone())).with_flag_toggle()
}

pub fn test_config() -> ShellConfig {
    ShellConfig {
        dev_mode: false,
        ..ShellConfig::default()
    }
}

pub fn services(keys: &Arc<MemoryKeyStore>, profiles: &Arc<MemoryProfileStore>) -> ShellServices {
    ShellServices::new(keys.clone(), profiles.clone())
}

pub fn onboarded_profiles() -> Arc<MemoryProfileStore> {
    Arc::new(MemoryProfileStore::with_profile(UserProfile::new("Ana")))
}

/// Applies events until `done` holds, failing the test after a timeout.
pub async fn settle_until(shell: &mut Shell, done: impl Fn(&Shell) -> bool) {
    for _ in 0..100 {
        if done(shell) {
            return;
        }
        tokio::time::timeout(Duration::from_secs(5), shell.next_event())
            .await
            .expect("shell event should arrive");
    }
    panic!("condition not reached");
}

/// Lets spawned tasks run until `done` holds.
pub async fn wait_for(done: impl Fn() -> bool) {
    for _ in 0..500 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
