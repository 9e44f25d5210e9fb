mod common;

use common::{
    label_factory, onboarded_profiles, registry_with, services, settle_until, test_config,
    wait_for, BuildLog, PendingReply,
};
use deskshell_core::debug_registry;
use deskshell_core::shell::DEBUG_STORE_HANDLE;
use deskshell_core::store::{
    FeatureFlagStore, MemoryFlagStore, MemoryKeyStore, NoopStartupSettings,
    StartupSettingsApplier, StoreError, StoreResult,
};
use deskshell_core::{
    FlagToggle, PanelContext, PanelFactory, RegistryEntry, Shell, ShellConfig, ShellServices,
    ViewId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Flag store whose read blocks until the test answers it.
struct BlockingFlagStore {
    answer: Mutex<mpsc::Receiver<bool>>,
}

impl FeatureFlagStore for BlockingFlagStore {
    fn get_alpha_enabled(&self) -> StoreResult<bool> {
        self.answer
            .lock()
            .unwrap()
            .recv()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }
}

struct FailingFlagStore;

impl FeatureFlagStore for FailingFlagStore {
    fn get_alpha_enabled(&self) -> StoreResult<bool> {
        Err(StoreError::Unavailable("flag file unreadable".to_string()))
    }
}

/// Startup applier that holds its worker until the test releases it.
struct BlockingStartupSettings {
    release: Mutex<mpsc::Receiver<()>>,
    applied: AtomicUsize,
}

impl StartupSettingsApplier for BlockingStartupSettings {
    fn apply(&self) -> StoreResult<()> {
        self.release
            .lock()
            .unwrap()
            .recv()
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

type ToggleSlot = Arc<Mutex<Option<FlagToggle>>>;

/// Settings entry that hands its flag setter to the test.
fn capturing_settings(log: &BuildLog, slot: &ToggleSlot) -> RegistryEntry {
    let inner = label_factory(log.clone());
    let slot = Arc::clone(slot);
    let factory: PanelFactory = Arc::new(move |ctx: PanelContext| {
        *slot.lock().unwrap() = ctx.flag_toggle.clone();
        inner(ctx)
    });
    RegistryEntry::eager(ViewId::Settings, factory).with_flag_toggle()
}

fn experimental_entries(log: &BuildLog) -> Vec<RegistryEntry> {
    vec![
        RegistryEntry::eager(ViewId::Lumaui, label_factory(log.clone())).experimental(),
        RegistryEntry::eager(ViewId::Agents, label_factory(log.clone())).experimental(),
    ]
}

async fn start(services: ShellServices, extra: Vec<RegistryEntry>, log: &BuildLog) -> Shell {
    let registry = registry_with(log, &PendingReply::default(), extra);
    Shell::start(&test_config(), registry, services)
        .await
        .expect("shell should start")
}

fn base_services() -> ShellServices {
    services(&Arc::new(MemoryKeyStore::new()), &onboarded_profiles())
}

fn sidebar(shell: &Shell) -> Vec<ViewId> {
    shell
        .render()
        .workspace()
        .and_then(|frame| frame.chrome.as_ref())
        .map(|chrome| chrome.sidebar.clone())
        .expect("dashboard has chrome")
}

#[tokio::test]
async fn startup_does_not_wait_for_the_flag_read() {
    let (answer, receiver) = mpsc::channel();
    let store = Arc::new(BlockingFlagStore {
        answer: Mutex::new(receiver),
    });
    let log = BuildLog::default();
    let mut shell = start(
        base_services().with_flags(store),
        experimental_entries(&log),
        &log,
    )
    .await;

    assert!(!shell.should_show_onboarding());
    assert!(!shell.flags().alpha_enabled);
    assert!(!sidebar(&shell).contains(&ViewId::Lumaui));

    answer.send(true).expect("flag read still waiting");
    settle_until(&mut shell, |shell| shell.flags().alpha_enabled).await;

    assert!(sidebar(&shell).contains(&ViewId::Lumaui));
    assert!(sidebar(&shell).contains(&ViewId::Agents));
    assert_eq!(
        shell.render().workspace().expect("workspace").content.text(),
        "dashboard refreshes=0 alpha=true"
    );
}

#[tokio::test]
async fn missing_flag_store_leaves_alpha_off() {
    let log = BuildLog::default();
    let mut shell = start(base_services(), experimental_entries(&log), &log).await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    shell.pump();
    assert!(!shell.flags().alpha_enabled);
    assert_eq!(
        sidebar(&shell),
        vec![ViewId::Dashboard, ViewId::Assistant, ViewId::Servers, ViewId::Help]
    );
}

#[tokio::test]
async fn failed_flag_read_leaves_alpha_off() {
    let log = BuildLog::default();
    let mut shell = start(
        base_services().with_flags(Arc::new(FailingFlagStore)),
        experimental_entries(&log),
        &log,
    )
    .await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(shell.pump(), 0);
    assert!(!shell.flags().alpha_enabled);
}

#[tokio::test]
async fn only_settings_receives_the_flag_setter() {
    let log = BuildLog::default();
    let slot = ToggleSlot::default();
    let observed = ToggleSlot::default();
    let help = {
        let inner = label_factory(log.clone());
        let observed = Arc::clone(&observed);
        let factory: PanelFactory = Arc::new(move |ctx: PanelContext| {
            *observed.lock().unwrap() = ctx.flag_toggle.clone();
            inner(ctx)
        });
        factory
    };
    let registry = registry_with(
        &log,
        &PendingReply::default(),
        vec![
            capturing_settings(&log, &slot),
            RegistryEntry::eager(ViewId::Notebooks, help),
        ],
    );
    let mut shell = Shell::start(&test_config(), registry, base_services())
        .await
        .expect("shell should start");

    shell.navigate(ViewId::Notebooks).expect("navigate");
    assert!(observed.lock().unwrap().is_none());
    shell.navigate(ViewId::Settings).expect("navigate");
    assert!(slot.lock().unwrap().is_some());
}

#[tokio::test]
async fn settings_toggle_updates_and_persists_the_flag() {
    let log = BuildLog::default();
    let slot = ToggleSlot::default();
    let flags = Arc::new(MemoryFlagStore::new(false));
    let mut extra = experimental_entries(&log);
    extra.push(capturing_settings(&log, &slot));
    let mut shell = start(base_services().with_flags(flags.clone()), extra, &log).await;
    tokio::time::timeout(Duration::from_secs(5), shell.next_event())
        .await
        .expect("startup flag read should resolve");

    shell.navigate(ViewId::Settings).expect("navigate");
    let toggle = slot.lock().unwrap().clone().expect("settings got a toggle");
    assert!(toggle.set_alpha_enabled(true));
    assert!(!shell.flags().alpha_enabled);

    assert_eq!(shell.pump(), 1);
    assert!(shell.flags().alpha_enabled);
    assert_eq!(
        shell.render().workspace().expect("workspace").content.text(),
        "settings refreshes=0 alpha=true"
    );
    wait_for(|| flags.get_alpha_enabled().unwrap_or(false)).await;
}

#[tokio::test]
async fn late_flag_read_does_not_override_the_user() {
    let (answer, receiver) = mpsc::channel();
    let store = Arc::new(BlockingFlagStore {
        answer: Mutex::new(receiver),
    });
    let log = BuildLog::default();
    let slot = ToggleSlot::default();
    let mut shell = start(
        base_services().with_flags(store),
        vec![capturing_settings(&log, &slot)],
        &log,
    )
    .await;

    shell.navigate(ViewId::Settings).expect("navigate");
    let toggle = slot.lock().unwrap().clone().expect("settings got a toggle");
    toggle.set_alpha_enabled(true);
    shell.pump();
    assert!(shell.flags().alpha_enabled);

    answer.send(false).expect("flag read still waiting");
    tokio::time::timeout(Duration::from_secs(5), shell.next_event())
        .await
        .expect("flag read should resolve");
    assert!(shell.flags().alpha_enabled);
}

#[tokio::test]
async fn startup_settings_are_applied_once() {
    let log = BuildLog::default();
    let applier = Arc::new(NoopStartupSettings::new());
    let shell = start(
        base_services().with_startup_settings(applier.clone()),
        Vec::new(),
        &log,
    )
    .await;

    wait_for(|| applier.applied_count() == 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(applier.applied_count(), 1);
    drop(shell);
}

#[tokio::test]
async fn development_mode_exposes_the_services_handle() {
    let log = BuildLog::default();
    let registry = registry_with(&log, &PendingReply::default(), Vec::new());
    let config = ShellConfig {
        dev_mode: true,
        ..ShellConfig::default()
    };
    let _shell = Shell::start(&config, registry, base_services())
        .await
        .expect("shell should start");

    let handle = debug_registry::lookup_as::<ShellServices>(DEBUG_STORE_HANDLE);
    assert!(handle.is_some());
}

#[tokio::test]
async fn pending_startup_settings_do_not_delay_the_profile_decision() {
    let (release, receiver) = mpsc::channel();
    let applier = Arc::new(BlockingStartupSettings {
        release: Mutex::new(receiver),
        applied: AtomicUsize::new(0),
    });
    let log = BuildLog::default();
    let shell = tokio::time::timeout(
        Duration::from_secs(5),
        start(
            base_services().with_startup_settings(applier.clone()),
            Vec::new(),
            &log,
        ),
    )
    .await
    .expect("start returns while settings are still applying");

    assert!(!shell.should_show_onboarding());
    assert_eq!(shell.current(), ViewId::Dashboard);
    assert_eq!(applier.applied.load(Ordering::SeqCst), 0);

    release.send(()).expect("applier still waiting");
    wait_for(|| applier.applied.load(Ordering::SeqCst) == 1).await;
}
