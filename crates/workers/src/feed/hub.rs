use dashmap::DashMap;
use std::sync::Arc;

use super::FeedLog;

/// Named feed logs shared between tailers, pollers and the HTTP surface.
#[derive(Clone)]
pub struct FeedHub {
    feeds: Arc<DashMap<String, Arc<FeedLog>>>,
    history: usize,
}

impl FeedHub {
    pub fn new(history: usize) -> Self {
        Self {
            feeds: Arc::new(DashMap::new()),
            history,
        }
    }

    pub fn ensure(&self, name: &str) -> Arc<FeedLog> {
        self.feeds
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(FeedLog::new(name, self.history)))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<FeedLog>> {
        self.feeds.get(name).map(|f| f.clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.feeds.iter().map(|f| f.key().clone()).collect();
        names.sort();
        names
    }
}
