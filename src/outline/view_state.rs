//! One-shot reveal instructions applied after a render.

use serde::{Deserialize, Serialize};

/// Which node to reveal after the next render, and how.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub locator_to_show: Option<String>,
    pub scroll_offset: i32,
    pub edit_display_name: bool,
}

impl ViewState {
    /// Reveal `locator` at the top of the viewport.
    pub fn show(locator: impl Into<String>) -> Self {
        Self {
            locator_to_show: Some(locator.into()),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn with_scroll_offset(mut self, offset: i32) -> Self {
        self.scroll_offset = offset;
        self
    }

    /// Open the inline rename editor of the revealed node.
    pub fn with_rename(mut self) -> Self {
        self.edit_display_name = true;
        self
    }
}

/// What the surface must do once a ViewState has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealRequest {
    pub locator: String,
    pub scroll_offset: i32,
    pub open_rename: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let state = ViewState::show("u9").with_scroll_offset(40).with_rename();
        assert_eq!(state.locator_to_show.as_deref(), Some("u9"));
        assert_eq!(state.scroll_offset, 40);
        assert!(state.edit_display_name);
    }

    #[test]
    fn test_deserialize_partial() {
        let state: ViewState = serde_json::from_str(r#"{"locator_to_show": "c1"}"#).unwrap();
        assert_eq!(state.scroll_offset, 0);
        assert!(!state.edit_display_name);
    }
}
