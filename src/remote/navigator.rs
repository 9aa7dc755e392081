//! Navigation away from the outline (unit editor pages).

use log::{info, warn};

/// Editor URL for a freshly created unit.
pub fn unit_editor_url(locator: &str) -> String {
    format!("/container/{}?action=new", locator)
}

/// Leaves the outline for another page.
pub trait Navigator {
    fn redirect(&mut self, url: &str);
}

/// Opens editor pages in the system browser.
///
/// Without a configured base URL the target is only logged; the caller
/// reads it back from the tree and shows it.
#[derive(Debug, Clone, Default)]
pub struct BrowserNavigator {
    base_url: Option<String>,
}

impl BrowserNavigator {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url.filter(|url| !url.trim().is_empty()),
        }
    }

    /// Absolute URL for `path`, when a base URL is configured.
    pub fn absolute(&self, path: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base.trim_end_matches('/'), path))
    }
}

impl Navigator for BrowserNavigator {
    fn redirect(&mut self, url: &str) {
        match self.absolute(url) {
            Some(target) => {
                info!("Opening {}", target);
                if let Err(e) = open::that(&target) {
                    warn!("Failed to open browser for {}: {}", target, e);
                }
            }
            None => info!("No studio base URL configured, not opening {}", url),
        }
    }
}

/// Remembers redirects instead of performing them.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    pub visited: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
}

#[cfg(test)]
impl Navigator for RecordingNavigator {
    fn redirect(&mut self, url: &str) {
        self.visited.borrow_mut().push(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_editor_url() {
        assert_eq!(
            unit_editor_url("vertical-9"),
            "/container/vertical-9?action=new"
        );
    }

    #[test]
    fn test_absolute_url() {
        let nav = BrowserNavigator::new(Some("https://studio.example.com/".to_string()));
        assert_eq!(
            nav.absolute("/container/v1?action=new").as_deref(),
            Some("https://studio.example.com/container/v1?action=new")
        );
        assert!(BrowserNavigator::new(Some("  ".to_string()))
            .absolute("/x")
            .is_none());
    }
}
