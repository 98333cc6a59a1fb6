use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

use super::{Tailer, TailerState};

/// A running, supervised tailer.
pub struct TailerHandle {
    feed: String,
    state: watch::Receiver<TailerState>,
    task: JoinHandle<()>,
}

impl TailerHandle {
    pub fn feed(&self) -> &str {
        &self.feed
    }

    pub fn state(&self) -> TailerState {
        *self.state.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<TailerState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawns `tailer` inside a supervising task that respawns it, after the
/// tailer's backoff, if it ever panics.
pub fn spawn_supervised(tailer: Tailer) -> TailerHandle {
    let feed = tailer.feed().to_string();
    let state = tailer.state();
    let task = tokio::spawn(supervise(tailer));
    TailerHandle { feed, state, task }
}

async fn supervise(tailer: Tailer) {
    loop {
        let child = tokio::spawn(tailer.clone().run());
        let _guard = AbortOnDrop(child.abort_handle());

        match child.await {
            Ok(()) => return,
            Err(e) if e.is_panic() => {
                tracing::error!(feed = %tailer.feed(), "tailer panicked, respawning after backoff");
                tailer.enter(TailerState::Erroring);
                tailer.metrics().inc_feed_failures();
                tailer.enter(TailerState::Backoff);
                tokio::time::sleep(tailer.backoff()).await;
                tailer.metrics().inc_feed_restarts();
            }
            Err(_) => return,
        }
    }
}
