//! Panel contract satisfied by every registry entry.

use crate::shell::events::{FlagToggle, Navigator};
use crate::store::FeatureFlags;
use crate::view::ViewId;
use std::sync::Arc;
use uuid::Uuid;

/// One constructed panel instance.
///
/// Panels own their internal work. The shell only decides when an instance
/// exists and whether it is visible.
pub trait Panel {
    /// Snapshot of the panel body for the rendering layer.
    fn render(&self) -> String;

    fn on_visibility_changed(&mut self, _visible: bool) {}

    fn on_flags_changed(&mut self, _flags: FeatureFlags) {}

    /// Fired when navigation re-targets the view that is already active.
    fn on_refresh(&mut self) {}
}

/// Builds one panel instance from its construction context.
pub type PanelFactory = Arc<dyn Fn(PanelContext) -> Box<dyn Panel> + Send + Sync>;

/// Wraps a closure as a [`PanelFactory`].
pub fn panel_factory<F, P>(build: F) -> PanelFactory
where
    F: Fn(PanelContext) -> P + Send + Sync + 'static,
    P: Panel + 'static,
{
    Arc::new(move |ctx| Box::new(build(ctx)) as Box<dyn Panel>)
}

/// Everything a panel receives at construction.
#[derive(Debug, Clone)]
pub struct PanelContext {
    pub view: ViewId,
    pub instance_id: Uuid,
    pub navigator: Navigator,
    pub user_name: Option<String>,
    pub flags: FeatureFlags,
    /// Present only for the entry registered with the flag setter.
    pub flag_toggle: Option<FlagToggle>,
}
