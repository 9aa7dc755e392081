//! Course document watcher.
//!
//! Watches the directory holding the course file and reports when the file
//! was changed by someone else, so the outline can refresh.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

/// Change notifications for the course document.
#[derive(Debug, Clone, PartialEq)]
pub enum CourseEvent {
    /// The document was written or replaced
    Changed(PathBuf),
    /// The document was removed
    Removed(PathBuf),
    /// The watcher encountered an error
    Error(String),
}

/// Watches one course document.
#[derive(Debug)]
pub struct CourseWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<CourseEvent>,
}

impl CourseWatcher {
    /// Start watching `course_path`.
    pub fn new(course_path: PathBuf) -> Result<Self, String> {
        let (tx, rx) = channel();
        let dir = course_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let target = course_path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                Self::handle_event(result, &target, &tx);
            },
            Config::default().with_poll_interval(Duration::from_millis(500)),
        )
        .map_err(|e| format!("Failed to create course watcher: {}", e))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| format!("Failed to watch {}: {}", dir.display(), e))?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    fn handle_event(
        result: Result<Event, notify::Error>,
        target: &Path,
        tx: &Sender<CourseEvent>,
    ) {
        match result {
            Ok(event) => {
                if let Some(evt) = classify(&event, target) {
                    let _ = tx.send(evt);
                }
            }
            Err(e) => {
                let _ = tx.send(CourseEvent::Error(e.to_string()));
            }
        }
    }

    /// Pending events since the last poll. Non-blocking.
    pub fn poll_events(&self) -> Vec<CourseEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Map a raw notify event onto the course document, ignoring other files.
fn classify(event: &Event, target: &Path) -> Option<CourseEvent> {
    if !event.paths.iter().any(|p| p == target) {
        return None;
    }
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            Some(CourseEvent::Changed(target.to_path_buf()))
        }
        EventKind::Remove(_) => Some(CourseEvent::Removed(target.to_path_buf())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_classify_ignores_other_files() {
        let target = Path::new("/courses/demo.json");
        let evt = event(EventKind::Modify(ModifyKind::Any), "/courses/other.json");
        assert_eq!(classify(&evt, target), None);
    }

    #[test]
    fn test_classify_course_changes() {
        let target = Path::new("/courses/demo.json");
        assert_eq!(
            classify(
                &event(EventKind::Create(CreateKind::File), "/courses/demo.json"),
                target
            ),
            Some(CourseEvent::Changed(target.to_path_buf()))
        );
        assert_eq!(
            classify(
                &event(EventKind::Remove(RemoveKind::File), "/courses/demo.json"),
                target
            ),
            Some(CourseEvent::Removed(target.to_path_buf()))
        );
    }
}
