//! In-process reply transport for unit tests
//!
//! Each `open` either replays a scripted event list or hands the producer
//! half of a fresh stream to the test, which then pushes events by hand.
//! Every opened request is recorded so tests can assert on what went out
//! and, just as importantly, on what did not.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MoodchatError, Result};
use crate::transport::{EventSender, EventStream, StreamEvent, StreamRequest, StreamTransport};

#[derive(Debug, Default)]
pub struct FakeStreamTransport {
    requests: Mutex<Vec<StreamRequest>>,
    scripts: Mutex<VecDeque<Vec<StreamEvent>>>,
    senders: Mutex<Vec<EventSender>>,
    fail_open: AtomicBool,
}

impl FakeStreamTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a complete reply for the next `open`.
    pub fn script(&self, events: Vec<StreamEvent>) {
        self.scripts.lock().unwrap().push_back(events);
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Producer half of the most recent unscripted stream.
    pub fn last_sender(&self) -> EventSender {
        self.senders
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no unscripted stream has been opened")
    }
}

#[async_trait]
impl StreamTransport for FakeStreamTransport {
    async fn open(&self, request: StreamRequest) -> Result<EventStream> {
        self.requests.lock().unwrap().push(request);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(MoodchatError::Transport("connection refused".into()).into());
        }
        if let Some(events) = self.scripts.lock().unwrap().pop_front() {
            return Ok(EventStream::from_events(events));
        }
        let (tx, stream) = EventStream::channel();
        self.senders.lock().unwrap().push(tx);
        Ok(stream)
    }
}
