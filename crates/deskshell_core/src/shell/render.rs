//! Render projection handed to the host UI layer.

use crate::view::ViewId;

/// Placeholder shown while a deferred panel is loading.
pub const LOADING_PLACEHOLDER: &str = "Loading Page...";

/// What owns the screen right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Onboarding,
    Workspace(WorkspaceFrame),
}

impl Screen {
    pub fn workspace(&self) -> Option<&WorkspaceFrame> {
        match self {
            Self::Onboarding => None,
            Self::Workspace(frame) => Some(frame),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFrame {
    pub current: ViewId,
    pub content: ContentFrame,
    /// Always present: the persistent panel stays mounted while hidden.
    pub background: BackgroundFrame,
    /// Sidebar and topbar, for views that render inside the frame.
    pub chrome: Option<Chrome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentFrame {
    Panel { view: ViewId, body: String },
    Loading(ViewId),
    LoadFailed { view: ViewId, reason: String },
    /// The persistent view is current; no normal panel is mounted.
    Background,
}

impl ContentFrame {
    /// Text a plain renderer would print for this frame.
    pub fn text(&self) -> String {
        match self {
            Self::Panel { body, .. } => body.clone(),
            Self::Loading(_) => LOADING_PLACEHOLDER.to_string(),
            Self::LoadFailed { view, reason } => format!("Failed to load {view}: {reason}"),
            Self::Background => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundFrame {
    pub view: ViewId,
    pub visible: bool,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chrome {
    pub sidebar: Vec<ViewId>,
    pub user_name: Option<String>,
    pub alpha_enabled: bool,
}
