//! Asynchronous request delivery to the course service.
//!
//! Requests are executed off the UI thread by a worker that owns the
//! service. Results come back as [`Completion`]s that the UI thread picks
//! up with [`Transport::poll`], once per frame. Completions of independent
//! requests may arrive in any order. There is no cancellation.

use super::service::OutlineService;
use crate::error::{Error, Result};
use crate::outline::{Category, Node};
use log::{debug, warn};
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Identifier handed out for each submitted request.
pub type RequestId = u64;

/// A call against the course service.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Fetch {
        locator: String,
    },
    CreateChild {
        parent: String,
        category: Category,
        display_name: String,
    },
    Delete {
        locator: String,
    },
    Duplicate {
        locator: String,
        parent: String,
    },
    Rename {
        locator: String,
        display_name: String,
    },
}

/// Successful outcome of a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Fetched(Node),
    Created(String),
    Deleted,
    Duplicated(String),
    Renamed,
}

/// A finished request.
#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub request: Request,
    pub result: Result<Response>,
}

/// Run one request against the service.
fn execute(service: &mut dyn OutlineService, request: &Request) -> Result<Response> {
    match request {
        Request::Fetch { locator } => service.fetch(locator).map(Response::Fetched),
        Request::CreateChild {
            parent,
            category,
            display_name,
        } => service
            .create_child(parent, *category, display_name)
            .map(Response::Created),
        Request::Delete { locator } => service.delete(locator).map(|_| Response::Deleted),
        Request::Duplicate { locator, parent } => service
            .duplicate(locator, parent)
            .map(Response::Duplicated),
        Request::Rename {
            locator,
            display_name,
        } => service
            .rename(locator, display_name)
            .map(|_| Response::Renamed),
    }
}

enum Mode {
    /// Requests run on a background thread.
    Worker {
        sender: Option<Sender<(RequestId, Request)>>,
        receiver: Receiver<Completion>,
        handle: Option<JoinHandle<()>>,
    },
    /// Requests run at submit time; completions still wait for the next poll.
    #[cfg(test)]
    Inline { service: Box<dyn OutlineService> },
}

/// Delivers requests to the course service and collects completions.
pub struct Transport {
    mode: Mode,
    next_id: RequestId,
    in_flight: usize,
    ready: VecDeque<Completion>,
}

impl Transport {
    /// Move `service` onto a worker thread.
    pub fn spawn(service: Box<dyn OutlineService>) -> Result<Self> {
        let (request_tx, request_rx) = channel::<(RequestId, Request)>();
        let (completion_tx, completion_rx) = channel::<Completion>();

        let handle = thread::Builder::new()
            .name("outline-transport".to_string())
            .spawn(move || {
                let mut service = service;
                while let Ok((id, request)) = request_rx.recv() {
                    let result = execute(service.as_mut(), &request);
                    if completion_tx
                        .send(Completion {
                            id,
                            request,
                            result,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
                debug!("Transport worker stopped");
            })
            .map_err(|e| Error::Transport(format!("failed to start worker: {}", e)))?;

        Ok(Self {
            mode: Mode::Worker {
                sender: Some(request_tx),
                receiver: completion_rx,
                handle: Some(handle),
            },
            next_id: 1,
            in_flight: 0,
            ready: VecDeque::new(),
        })
    }

    /// Execute requests on the calling thread at submit time.
    #[cfg(test)]
    pub fn inline(service: Box<dyn OutlineService>) -> Self {
        Self {
            mode: Mode::Inline { service },
            next_id: 1,
            in_flight: 0,
            ready: VecDeque::new(),
        }
    }

    /// Issue a request. Its completion is delivered by a later [`poll`](Self::poll).
    pub fn submit(&mut self, request: Request) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.in_flight += 1;
        debug!("Request #{} submitted: {:?}", id, request);

        match &mut self.mode {
            #[cfg(test)]
            Mode::Inline { service } => {
                let result = execute(service.as_mut(), &request);
                self.ready.push_back(Completion {
                    id,
                    request,
                    result,
                });
            }
            Mode::Worker { sender, .. } => {
                let delivered = sender
                    .as_ref()
                    .map(|tx| tx.send((id, request.clone())).is_ok())
                    .unwrap_or(false);
                if !delivered {
                    warn!("Transport worker unavailable, failing request #{}", id);
                    self.ready.push_back(Completion {
                        id,
                        request,
                        result: Err(Error::Transport("worker is not running".to_string())),
                    });
                }
            }
        }
        id
    }

    /// Collect every completion available right now. Never blocks.
    pub fn poll(&mut self) -> Vec<Completion> {
        match &self.mode {
            Mode::Worker { receiver, .. } => {
                while let Ok(completion) = receiver.try_recv() {
                    self.ready.push_back(completion);
                }
            }
            #[cfg(test)]
            Mode::Inline { .. } => {}
        }
        self.drain_ready()
    }

    /// Block until at least one completion is available or `timeout` passes.
    #[cfg(test)]
    pub fn wait(&mut self, timeout: std::time::Duration) -> Vec<Completion> {
        if self.ready.is_empty() {
            if let Mode::Worker { receiver, .. } = &self.mode {
                match receiver.recv_timeout(timeout) {
                    Ok(completion) => self.ready.push_back(completion),
                    Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                    Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                        warn!("Transport worker disconnected");
                    }
                }
            }
        }
        self.poll()
    }

    fn drain_ready(&mut self) -> Vec<Completion> {
        let completions: Vec<Completion> = self.ready.drain(..).collect();
        self.in_flight = self.in_flight.saturating_sub(completions.len());
        completions
    }

    /// Number of submitted requests whose completion has not been polled yet.
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        match &mut self.mode {
            Mode::Worker { sender, handle, .. } => {
                // Closing the channel ends the worker loop
                sender.take();
                if let Some(handle) = handle.take() {
                    let _ = handle.join();
                }
            }
            #[cfg(test)]
            Mode::Inline { .. } => {}
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            Mode::Worker { .. } => "worker",
            #[cfg(test)]
            Mode::Inline { .. } => "inline",
        };
        f.debug_struct("Transport")
            .field("mode", &mode)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::CourseStore;
    use std::time::{Duration, Instant};

    fn course() -> Node {
        Node::new("course", Category::Course, "Demo")
            .with_children(vec![Node::new("chapter-1", Category::Chapter, "Week 1")])
    }

    #[test]
    fn test_inline_completion_waits_for_poll() {
        let mut transport = Transport::inline(Box::new(CourseStore::in_memory(course())));
        let id = transport.submit(Request::Fetch {
            locator: "chapter-1".to_string(),
        });
        assert_eq!(transport.in_flight(), 1);

        let completions = transport.poll();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].id, id);
        assert!(matches!(
            &completions[0].result,
            Ok(Response::Fetched(node)) if node.display_name == "Week 1"
        ));
        assert_eq!(transport.in_flight(), 0);
        assert!(transport.poll().is_empty());
    }

    #[test]
    fn test_inline_failure_is_reported() {
        let mut transport = Transport::inline(Box::new(CourseStore::in_memory(course())));
        transport.submit(Request::Delete {
            locator: "missing".to_string(),
        });
        let completions = transport.poll();
        assert!(matches!(completions[0].result, Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn test_worker_executes_in_order_submitted() {
        let mut transport = Transport::spawn(Box::new(CourseStore::in_memory(course()))).unwrap();
        let create = transport.submit(Request::CreateChild {
            parent: "course".to_string(),
            category: Category::Chapter,
            display_name: "Section".to_string(),
        });
        let fetch = transport.submit(Request::Fetch {
            locator: "course".to_string(),
        });

        let mut completions = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while completions.len() < 2 && Instant::now() < deadline {
            completions.extend(transport.wait(Duration::from_millis(100)));
        }

        assert_eq!(completions.len(), 2);
        assert_eq!(completions[0].id, create);
        assert_eq!(completions[1].id, fetch);
        assert!(matches!(
            &completions[1].result,
            Ok(Response::Fetched(root)) if root.children().len() == 2
        ));
    }
}
