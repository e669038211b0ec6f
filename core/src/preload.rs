use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreloadPriority {
    Low = 1,
    Normal = 2,
    High = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreloadStatus {
    Queued,
    Loading,
    Loaded,
}

/// Fetches one whole asset. Resolves `true` on success; failures resolve `false`
/// and are treated as loaded so the queue never stalls.
pub trait AssetLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, bool>;
}

pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

struct Waiter {
    url: String,
    priority: PreloadPriority,
    seq: u64,
    done: oneshot::Sender<()>,
}

struct QueueState {
    max_concurrent: usize,
    statuses: HashMap<String, PreloadStatus>,
    pending: Vec<Waiter>,
    in_flight: usize,
    next_seq: u64,
    drain_scheduled: bool,
}

impl QueueState {
    fn take_next(&mut self) -> Option<Waiter> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.priority.cmp(&b.priority).then(b.seq.cmp(&a.seq)))
            .map(|(idx, _)| idx)?;
        Some(self.pending.remove(idx))
    }
}

/// Bounded-concurrency warm cache for expensive assets.
#[derive(Clone)]
pub struct PreloadQueue {
    state: Rc<RefCell<QueueState>>,
    loader: Rc<dyn AssetLoader>,
    spawner: Spawner,
}

impl PreloadQueue {
    pub fn new(max_concurrent: usize, loader: Rc<dyn AssetLoader>, spawner: Spawner) -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                max_concurrent: max_concurrent.max(1),
                statuses: HashMap::new(),
                pending: Vec::new(),
                in_flight: 0,
                next_seq: 0,
                drain_scheduled: false,
            })),
            loader,
            spawner,
        }
    }

    /// Resolves once `url` has been fetched (or failed). Never rejects.
    pub fn preload(&self, url: &str, priority: PreloadPriority) -> LocalBoxFuture<'static, ()> {
        if url.is_empty() {
            return future::ready(()).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.borrow_mut();
            let status = state
                .statuses
                .entry(url.to_string())
                .or_insert(PreloadStatus::Queued);
            if *status == PreloadStatus::Loaded {
                return future::ready(()).boxed_local();
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.pending.push(Waiter {
                url: url.to_string(),
                priority,
                seq,
                done: tx,
            });
        }
        self.schedule_drain();
        rx.map(|_| ()).boxed_local()
    }

    pub fn status(&self, url: &str) -> Option<PreloadStatus> {
        self.state.borrow().statuses.get(url).copied()
    }

    pub fn in_flight(&self) -> usize {
        self.state.borrow().in_flight
    }

    pub fn pending(&self) -> usize {
        self.state.borrow().pending.len()
    }

    // Requests submitted in the same tick are ordered together before any
    // fetch starts.
    fn schedule_drain(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.drain_scheduled {
                return;
            }
            state.drain_scheduled = true;
        }
        let queue = self.clone();
        (self.spawner)(
            async move {
                queue.state.borrow_mut().drain_scheduled = false;
                queue.drain();
            }
            .boxed_local(),
        );
    }

    fn drain(&self) {
        loop {
            let waiter = {
                let mut state = self.state.borrow_mut();
                if state.in_flight >= state.max_concurrent {
                    return;
                }
                let Some(waiter) = state.take_next() else {
                    return;
                };
                match state.statuses.get(&waiter.url) {
                    Some(PreloadStatus::Loaded) | None => {
                        let _ = waiter.done.send(());
                        continue;
                    }
                    _ => {}
                }
                state.in_flight += 1;
                state
                    .statuses
                    .insert(waiter.url.clone(), PreloadStatus::Loading);
                waiter
            };
            self.dispatch(waiter);
        }
    }

    fn dispatch(&self, waiter: Waiter) {
        let load = self.loader.load(&waiter.url);
        let queue = self.clone();
        (self.spawner)(
            async move {
                let _ = load.await;
                {
                    let mut state = queue.state.borrow_mut();
                    state.statuses.insert(waiter.url, PreloadStatus::Loaded);
                    state.in_flight = state.in_flight.saturating_sub(1);
                }
                let _ = waiter.done.send(());
                queue.drain();
            }
            .boxed_local(),
        );
    }
}
