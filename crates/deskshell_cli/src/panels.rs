//! Demo panels wired into the CLI registry.
//!
//! Bodies are one-line summaries; the point is to exercise mounting,
//! teardown, deferred loading and the persistent assistant.

use deskshell_core::{
    panel_factory, panel_loader, FeatureFlags, Panel, PanelContext, PanelFactory, PanelLoadError,
    RegistryEntry, RegistryError, ViewId, ViewRegistry,
};
use std::time::Duration;

const LOAD_DELAY: Duration = Duration::from_millis(25);

struct DemoPanel {
    view: ViewId,
    user: String,
    flags: FeatureFlags,
    refreshes: u32,
    has_toggle: bool,
}

impl Panel for DemoPanel {
    fn render(&self) -> String {
        let mut body = format!(
            "{} for {} (alpha={}, refreshes={})",
            self.view, self.user, self.flags.alpha_enabled, self.refreshes
        );
        if self.has_toggle {
            body.push_str(" [alpha toggle]");
        }
        body
    }

    fn on_flags_changed(&mut self, flags: FeatureFlags) {
        self.flags = flags;
    }

    fn on_refresh(&mut self) {
        self.refreshes += 1;
    }
}

fn demo_factory() -> PanelFactory {
    panel_factory(|ctx: PanelContext| DemoPanel {
        view: ctx.view,
        user: ctx.user_name.unwrap_or_else(|| "guest".to_string()),
        flags: ctx.flags,
        refreshes: 0,
        has_toggle: ctx.flag_toggle.is_some(),
    })
}

/// Assistant that remembers how often it was shown.
struct AssistantPanel {
    shown: u32,
    visible: bool,
}

impl Panel for AssistantPanel {
    fn render(&self) -> String {
        format!(
            "assistant session (shown {} times, visible={})",
            self.shown, self.visible
        )
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        if visible {
            self.shown += 1;
        }
        self.visible = visible;
    }
}

fn deferred(view: ViewId) -> RegistryEntry {
    RegistryEntry::deferred(
        view,
        panel_loader(|| async {
            tokio::time::sleep(LOAD_DELAY).await;
            Ok::<_, PanelLoadError>(demo_factory())
        }),
    )
}

fn eager(view: ViewId) -> RegistryEntry {
    RegistryEntry::eager(view, demo_factory())
}

/// Registry with every known view.
pub fn demo_registry() -> Result<ViewRegistry, RegistryError> {
    let assistant = panel_factory(|_ctx: PanelContext| AssistantPanel {
        shown: 0,
        visible: false,
    });

    ViewRegistry::builder()
        .entry(eager(ViewId::Dashboard))
        .entry(deferred(ViewId::Settings).with_flag_toggle())
        .entry(eager(ViewId::Debug))
        .entry(eager(ViewId::Help))
        .entry(eager(ViewId::Notebooks))
        .entry(eager(ViewId::ImageGen).fullscreen())
        .entry(deferred(ViewId::Gallery).fullscreen())
        .entry(deferred(ViewId::N8n).fullscreen())
        .entry(eager(ViewId::Servers).fullscreen())
        .entry(deferred(ViewId::Agents).fullscreen().experimental())
        .entry(deferred(ViewId::Lumaui).experimental())
        .entry(eager(ViewId::LumauiLite).experimental())
        .entry(
            RegistryEntry::eager(ViewId::Assistant, assistant)
                .persistent()
                .fullscreen(),
        )
        .build()
}
