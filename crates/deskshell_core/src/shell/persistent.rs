//! Long-lived slot for the persistent background view.
//!
//! # Invariants
//! - Built once per shell; there is no teardown path short of dropping the
//!   shell itself.
//! - Visibility is a projection of navigation state, never a rebuild.

use crate::registry::{Panel, PanelContext, PanelFactory};
use crate::store::FeatureFlags;
use crate::view::ViewId;
use log::{debug, info};
use uuid::Uuid;

pub struct PersistentView {
    view: ViewId,
    instance_id: Uuid,
    panel: Box<dyn Panel>,
    visible: bool,
}

impl PersistentView {
    pub(crate) fn construct(factory: &PanelFactory, ctx: PanelContext) -> Self {
        let view = ctx.view;
        let instance_id = ctx.instance_id;
        let panel = factory(ctx);
        info!(
            "event=persistent_view_construct module=persistent status=ok view={view} instance_id={instance_id}"
        );
        Self {
            view,
            instance_id,
            panel,
            visible: false,
        }
    }

    pub fn view(&self) -> ViewId {
        self.view
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn render(&self) -> String {
        self.panel.render()
    }

    /// Applies the visibility projection; hooks fire only on change.
    pub(crate) fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        debug!(
            "event=persistent_view_visibility module=persistent status=ok view={} visible={visible}",
            self.view
        );
        self.panel.on_visibility_changed(visible);
    }

    pub(crate) fn refresh(&mut self) {
        self.panel.on_refresh();
    }

    pub(crate) fn flags_changed(&mut self, flags: FeatureFlags) {
        self.panel.on_flags_changed(flags);
    }
}
