//! Input events fed to the map controller and notices it reports back.

use std::fmt;

use crate::surface::{LayerHandle, ScreenPoint};

/// Map tools available in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    /// Pan the map and select features
    #[default]
    Select,
    /// Draw a route by dragging
    Freehand,
    /// Click points to measure distances
    Measure,
    /// Click to place a marker
    PlaceMarker,
}

impl Tool {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Freehand => "Freehand",
            Tool::Measure => "Measure",
            Tool::PlaceMarker => "Place Marker",
        }
    }

    /// Get all available tools.
    pub fn all() -> &'static [Tool] {
        &[Tool::Select, Tool::Freehand, Tool::Measure, Tool::PlaceMarker]
    }
}

/// Keys the map reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
}

/// Events delivered by the map surface, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Pointer pressed on the map background
    PointerDown(ScreenPoint),
    /// Pointer moved (pressed or not)
    PointerMove(ScreenPoint),
    /// Pointer released
    PointerUp(ScreenPoint),
    /// Click on the map background
    MapClick(ScreenPoint),
    /// Click on a rendered layer
    LayerClick(LayerHandle),
    /// Keyboard input while the map has focus
    KeyPressed(Key),
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user (toast).
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.level, self.message)
    }
}

