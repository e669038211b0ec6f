use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use showcase_core::{AssetLoader, PreloadPriority, PreloadQueue, PreloadStatus};

#[derive(Default)]
struct ManualLoader {
    pending: RefCell<Vec<(String, oneshot::Sender<bool>)>>,
    started: RefCell<Vec<String>>,
}

impl ManualLoader {
    fn finish_oldest(&self) -> Option<String> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            return None;
        }
        let (url, tx) = pending.remove(0);
        let _ = tx.send(true);
        Some(url)
    }
}

impl AssetLoader for ManualLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, bool> {
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push((url.to_string(), tx));
        self.started.borrow_mut().push(url.to_string());
        rx.map(|res| res.unwrap_or(false)).boxed_local()
    }
}

fn setup() -> (LocalPool, Rc<ManualLoader>, PreloadQueue) {
    let pool = LocalPool::new();
    let loader = Rc::new(ManualLoader::default());
    let spawner = pool.spawner();
    let queue = PreloadQueue::new(
        2,
        loader.clone(),
        Rc::new(move |fut: LocalBoxFuture<'static, ()>| {
            let _ = spawner.spawn_local(fut);
        }),
    );
    (pool, loader, queue)
}

fn track(pool: &LocalPool, fut: LocalBoxFuture<'static, ()>, counter: &Rc<Cell<usize>>) {
    let counter = counter.clone();
    let _ = pool.spawner().spawn_local(async move {
        fut.await;
        counter.set(counter.get() + 1);
    });
}

#[test]
fn concurrency_never_exceeds_cap() {
    let (mut pool, loader, queue) = setup();
    let resolved = Rc::new(Cell::new(0));
    let priorities = [
        PreloadPriority::Low,
        PreloadPriority::High,
        PreloadPriority::Normal,
    ];
    for idx in 0..9 {
        let url = format!("/art/{idx}.gif");
        track(&pool, queue.preload(&url, priorities[idx % 3]), &resolved);
    }
    pool.run_until_stalled();
    assert_eq!(queue.in_flight(), 2);

    let mut peak = queue.in_flight();
    while loader.finish_oldest().is_some() {
        pool.run_until_stalled();
        peak = peak.max(queue.in_flight());
    }
    assert_eq!(resolved.get(), 9);
    assert_eq!(peak, 2);
    assert_eq!(loader.started.borrow().len(), 9);
    assert_eq!(queue.status("/art/4.gif"), Some(PreloadStatus::Loaded));
}

#[test]
fn high_priority_dispatches_before_earlier_lows() {
    let (mut pool, loader, queue) = setup();
    let resolved = Rc::new(Cell::new(0));
    track(&pool, queue.preload("/art/low-a.gif", PreloadPriority::Low), &resolved);
    track(&pool, queue.preload("/art/low-b.gif", PreloadPriority::Low), &resolved);
    track(&pool, queue.preload("/art/high.gif", PreloadPriority::High), &resolved);
    pool.run_until_stalled();

    let started = loader.started.borrow().clone();
    assert_eq!(started, vec!["/art/high.gif", "/art/low-a.gif"]);

    loader.finish_oldest();
    pool.run_until_stalled();
    assert_eq!(loader.started.borrow().last().map(String::as_str), Some("/art/low-b.gif"));
}

#[test]
fn saturated_queue_prefers_priority_then_fifo() {
    let (mut pool, loader, queue) = setup();
    let resolved = Rc::new(Cell::new(0));
    track(&pool, queue.preload("/busy-1.gif", PreloadPriority::Normal), &resolved);
    track(&pool, queue.preload("/busy-2.gif", PreloadPriority::Normal), &resolved);
    pool.run_until_stalled();

    track(&pool, queue.preload("/n-1.gif", PreloadPriority::Normal), &resolved);
    track(&pool, queue.preload("/l-1.gif", PreloadPriority::Low), &resolved);
    track(&pool, queue.preload("/n-2.gif", PreloadPriority::Normal), &resolved);
    track(&pool, queue.preload("/h-1.gif", PreloadPriority::High), &resolved);
    pool.run_until_stalled();
    assert_eq!(queue.pending(), 4);

    while loader.finish_oldest().is_some() {
        pool.run_until_stalled();
    }
    let started = loader.started.borrow().clone();
    assert_eq!(
        &started[2..],
        &["/h-1.gif", "/n-1.gif", "/n-2.gif", "/l-1.gif"]
    );
    assert_eq!(resolved.get(), 6);
}
