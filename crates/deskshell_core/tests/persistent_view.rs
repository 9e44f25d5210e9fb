mod common;

use common::{
    eager_settings, onboarded_profiles, registry_with, services, test_config, wait_for, BuildLog,
    PendingReply,
};
use deskshell_core::store::MemoryKeyStore;
use deskshell_core::{ContentFrame, Shell, ViewId};
use std::sync::Arc;
use tokio::sync::oneshot;

async fn start(log: &BuildLog, pending: &PendingReply) -> Shell {
    let registry = registry_with(log, pending, vec![eager_settings(log)]);
    let keys = Arc::new(MemoryKeyStore::new());
    Shell::start(&test_config(), registry, services(&keys, &onboarded_profiles()))
        .await
        .expect("shell should start")
}

#[tokio::test]
async fn assistant_state_survives_a_round_trip() {
    let log = BuildLog::default();
    let (reply, receiver) = oneshot::channel();
    let pending = PendingReply::default();
    *pending.lock().unwrap() = Some(receiver);
    let mut shell = start(&log, &pending).await;
    let instance = shell.persistent_view().instance_id();

    shell.navigate(ViewId::Assistant).expect("open assistant");
    assert_eq!(
        shell.persistent_view().render(),
        "assistant messages=1 reply=pending visible=true"
    );

    shell.navigate(ViewId::Settings).expect("to settings");
    shell.navigate(ViewId::Help).expect("to help");
    assert!(!shell.persistent_view().is_visible());

    reply.send("hello".to_string()).expect("assistant still listening");
    wait_for(|| shell.persistent_view().render().contains("reply=hello")).await;

    shell.navigate(ViewId::Assistant).expect("back to assistant");
    assert_eq!(shell.persistent_view().instance_id(), instance);
    assert_eq!(log.count(ViewId::Assistant), 1);
    assert_eq!(
        shell.persistent_view().render(),
        "assistant messages=2 reply=hello visible=true"
    );
}

#[tokio::test]
async fn visibility_tracks_the_current_view() {
    let log = BuildLog::default();
    let mut shell = start(&log, &PendingReply::default()).await;

    for view in [
        ViewId::Help,
        ViewId::Assistant,
        ViewId::Servers,
        ViewId::Assistant,
        ViewId::Settings,
        ViewId::Dashboard,
    ] {
        shell.navigate(view).expect("navigate");
        let screen = shell.render();
        let frame = screen.workspace().expect("workspace frame");
        let expected = view == ViewId::Assistant;
        assert_eq!(frame.background.visible, expected, "current={view}");
        assert_eq!(frame.background.view, ViewId::Assistant);
        assert_eq!(frame.content == ContentFrame::Background, expected);
    }
    assert_eq!(log.count(ViewId::Assistant), 1);
}

#[tokio::test]
async fn repeat_navigation_to_assistant_keeps_the_instance() {
    let log = BuildLog::default();
    let mut shell = start(&log, &PendingReply::default()).await;
    let instance = shell.persistent_view().instance_id();

    shell.navigate(ViewId::Assistant).expect("navigate");
    shell.navigate(ViewId::Assistant).expect("navigate again");

    assert!(shell.persistent_view().is_visible());
    assert_eq!(shell.persistent_view().instance_id(), instance);
    assert_eq!(log.count(ViewId::Assistant), 1);
}

#[tokio::test]
async fn fullscreen_views_render_without_chrome() {
    let log = BuildLog::default();
    let mut shell = start(&log, &PendingReply::default()).await;

    let screen = shell.render();
    assert!(screen.workspace().expect("workspace").chrome.is_some());

    shell.navigate(ViewId::Assistant).expect("navigate");
    let screen = shell.render();
    assert!(screen.workspace().expect("workspace").chrome.is_none());

    shell.navigate(ViewId::Servers).expect("navigate");
    let screen = shell.render();
    assert!(screen.workspace().expect("workspace").chrome.is_none());
}
