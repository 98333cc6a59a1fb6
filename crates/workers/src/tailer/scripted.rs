use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stormwatch_common::Record;

use crate::feed::{FeedError, FeedSource, FeedTail};

/// How one opened tail ends after yielding its records.
#[derive(Clone)]
pub enum Ending {
    Fail,
    Panic,
    Hang,
}

#[derive(Clone)]
pub struct Session {
    pub records: Vec<Record>,
    pub ending: Ending,
}

/// A feed source that plays back one scripted session per `open`.
pub struct ScriptedSource {
    name: String,
    sessions: Mutex<VecDeque<Session>>,
    opens: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &str, sessions: Vec<Session>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            sessions: Mutex::new(sessions.into()),
            opens: AtomicUsize::new(0),
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<Box<dyn FeedTail>, FeedError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let session = self.sessions.lock().unwrap().pop_front().unwrap_or(Session {
            records: Vec::new(),
            ending: Ending::Hang,
        });
        Ok(Box::new(ScriptedTail {
            records: session.records.into(),
            ending: session.ending,
        }))
    }
}

struct ScriptedTail {
    records: VecDeque<Record>,
    ending: Ending,
}

#[async_trait]
impl FeedTail for ScriptedTail {
    async fn next(&mut self) -> Result<Record, FeedError> {
        if let Some(record) = self.records.pop_front() {
            return Ok(record);
        }
        match self.ending {
            Ending::Fail => Err(FeedError::Source("connection reset".into())),
            Ending::Panic => panic!("tail blew up"),
            Ending::Hang => std::future::pending().await,
        }
    }
}
