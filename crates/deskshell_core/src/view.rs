//! Closed set of view identifiers known at build time.
//!
//! # Responsibility
//! - Name every panel the shell can route to.
//! - Provide the stable string tokens used for persistence.
//!
//! # Invariants
//! - Parsing is exact: lowercase tokens only, no trimming of inner content.
//! - The legacy `clara` token restores to `ViewId::Assistant`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Identifier of one panel in the closed registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewId {
    Dashboard,
    Settings,
    Debug,
    Help,
    Notebooks,
    ImageGen,
    Gallery,
    N8n,
    Servers,
    Agents,
    Lumaui,
    LumauiLite,
    #[serde(alias = "clara")]
    Assistant,
}

/// Persisted token for the dashboard view.
pub const VIEW_DASHBOARD: &str = "dashboard";
/// Persisted token for the settings view.
pub const VIEW_SETTINGS: &str = "settings";
/// Persisted token for the debug view.
pub const VIEW_DEBUG: &str = "debug";
/// Persisted token for the help view.
pub const VIEW_HELP: &str = "help";
/// Persisted token for the notebooks view.
pub const VIEW_NOTEBOOKS: &str = "notebooks";
/// Persisted token for the image generation view.
pub const VIEW_IMAGE_GEN: &str = "image-gen";
/// Persisted token for the gallery view.
pub const VIEW_GALLERY: &str = "gallery";
/// Persisted token for the workflow automation view.
pub const VIEW_N8N: &str = "n8n";
/// Persisted token for the model servers view.
pub const VIEW_SERVERS: &str = "servers";
/// Persisted token for the agent studio view.
pub const VIEW_AGENTS: &str = "agents";
/// Persisted token for the UI builder view.
pub const VIEW_LUMAUI: &str = "lumaui";
/// Persisted token for the lightweight UI builder view.
pub const VIEW_LUMAUI_LITE: &str = "lumaui-lite";
/// Persisted token for the assistant view.
pub const VIEW_ASSISTANT: &str = "assistant";

const LEGACY_ASSISTANT_TOKEN: &str = "clara";

impl ViewId {
    /// Every identifier, in sidebar order.
    pub const ALL: [ViewId; 13] = [
        ViewId::Dashboard,
        ViewId::Assistant,
        ViewId::Notebooks,
        ViewId::Agents,
        ViewId::ImageGen,
        ViewId::Gallery,
        ViewId::Lumaui,
        ViewId::LumauiLite,
        ViewId::N8n,
        ViewId::Servers,
        ViewId::Settings,
        ViewId::Debug,
        ViewId::Help,
    ];

    /// Stable token used in persistence and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => VIEW_DASHBOARD,
            Self::Settings => VIEW_SETTINGS,
            Self::Debug => VIEW_DEBUG,
            Self::Help => VIEW_HELP,
            Self::Notebooks => VIEW_NOTEBOOKS,
            Self::ImageGen => VIEW_IMAGE_GEN,
            Self::Gallery => VIEW_GALLERY,
            Self::N8n => VIEW_N8N,
            Self::Servers => VIEW_SERVERS,
            Self::Agents => VIEW_AGENTS,
            Self::Lumaui => VIEW_LUMAUI,
            Self::LumauiLite => VIEW_LUMAUI_LITE,
            Self::Assistant => VIEW_ASSISTANT,
        }
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewId {
    type Err = ViewParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_view_id(value)
    }
}

/// Parses one view identifier from its persisted token.
pub fn parse_view_id(value: &str) -> Result<ViewId, ViewParseError> {
    if value.trim().is_empty() {
        return Err(ViewParseError::Empty);
    }

    match value {
        VIEW_DASHBOARD => Ok(ViewId::Dashboard),
        VIEW_SETTINGS => Ok(ViewId::Settings),
        VIEW_DEBUG => Ok(ViewId::Debug),
        VIEW_HELP => Ok(ViewId::Help),
        VIEW_NOTEBOOKS => Ok(ViewId::Notebooks),
        VIEW_IMAGE_GEN => Ok(ViewId::ImageGen),
        VIEW_GALLERY => Ok(ViewId::Gallery),
        VIEW_N8N => Ok(ViewId::N8n),
        VIEW_SERVERS => Ok(ViewId::Servers),
        VIEW_AGENTS => Ok(ViewId::Agents),
        VIEW_LUMAUI => Ok(ViewId::Lumaui),
        VIEW_LUMAUI_LITE => Ok(ViewId::LumauiLite),
        VIEW_ASSISTANT | LEGACY_ASSISTANT_TOKEN => Ok(ViewId::Assistant),
        other => Err(ViewParseError::UnknownView(other.to_string())),
    }
}

/// View token parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewParseError {
    Empty,
    UnknownView(String),
}

impl Display for ViewParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "view identifier must not be empty"),
            Self::UnknownView(value) => write!(f, "unknown view identifier: {value}"),
        }
    }
}

impl Error for ViewParseError {}
