use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use showcase_core::{AssetDate, AssetEntry, Gallery, GallerySink, ManifestError, ManifestSource};

#[derive(Default)]
struct PendingSource {
    fetches: Cell<usize>,
    reply: RefCell<Option<oneshot::Sender<Result<String, ManifestError>>>>,
}

impl PendingSource {
    fn respond(&self, body: Result<&str, &str>) {
        let tx = self.reply.borrow_mut().take().expect("fetch in flight");
        let _ = tx.send(
            body.map(str::to_string)
                .map_err(|err| ManifestError::Fetch(err.to_string())),
        );
    }
}

impl ManifestSource for PendingSource {
    fn fetch_manifest(&self, _url: &str) -> LocalBoxFuture<'static, Result<String, ManifestError>> {
        self.fetches.set(self.fetches.get() + 1);
        let (tx, rx) = oneshot::channel();
        *self.reply.borrow_mut() = Some(tx);
        rx.map(|res| res.unwrap_or_else(|_| Err(ManifestError::Fetch("dropped".into()))))
            .boxed_local()
    }
}

#[derive(Default)]
struct RecordingSink {
    log: RefCell<Vec<String>>,
    items: RefCell<Vec<AssetEntry>>,
}

impl GallerySink for RecordingSink {
    fn show(&self) {
        self.log.borrow_mut().push("show".into());
    }
    fn hide(&self) {
        self.log.borrow_mut().push("hide".into());
    }
    fn reset(&self) {
        self.log.borrow_mut().push("reset".into());
    }
    fn relayout(&self) {
        self.log.borrow_mut().push("relayout".into());
    }
    fn render_item(&self, index: usize, entry: &AssetEntry) {
        assert_eq!(index, self.items.borrow().len());
        self.items.borrow_mut().push(entry.clone());
    }
    fn rendered(&self) {
        self.log.borrow_mut().push("rendered".into());
    }
    fn load_failed(&self, _error: &ManifestError) {
        self.log.borrow_mut().push("failed".into());
    }
}

fn setup() -> (LocalPool, Rc<PendingSource>, Rc<RecordingSink>, Gallery<PendingSource, RecordingSink>) {
    let source = Rc::new(PendingSource::default());
    let sink = Rc::new(RecordingSink::default());
    let gallery = Gallery::new("/home/src/art/artlist.json", source.clone(), sink.clone());
    (LocalPool::new(), source, sink, gallery)
}

fn activate(pool: &LocalPool, gallery: &Gallery<PendingSource, RecordingSink>) -> bool {
    match gallery.activate() {
        Some(load) => {
            let _ = pool.spawner().spawn_local(load);
            true
        }
        None => false,
    }
}

#[test]
fn concurrent_activations_fetch_once() {
    let (mut pool, source, sink, gallery) = setup();
    assert!(activate(&pool, &gallery));
    assert!(!activate(&pool, &gallery));
    pool.run_until_stalled();
    assert_eq!(source.fetches.get(), 1);

    source.respond(Ok(r#"[{"fname":"a.png","date":"1"},{"fname":"b.gif","date":2}]"#));
    pool.run_until_stalled();
    assert_eq!(sink.items.borrow().len(), 2);

    assert!(!activate(&pool, &gallery));
    pool.run_until_stalled();
    assert_eq!(source.fetches.get(), 1);
    assert_eq!(sink.items.borrow().len(), 2);
    assert_eq!(
        sink.log.borrow().as_slice(),
        ["show", "reset", "show", "relayout", "rendered", "show", "relayout"]
    );
}

#[test]
fn duplicate_filenames_keep_first_date() {
    let (mut pool, source, sink, gallery) = setup();
    activate(&pool, &gallery);
    pool.run_until_stalled();
    source.respond(Ok(
        r#"[{"fname":"a.png","date":"1700000000"},{"fname":"a.png","date":"1700000001"}]"#,
    ));
    pool.run_until_stalled();

    let items = sink.items.borrow();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].fname, "a.png");
    assert_eq!(items[0].date, AssetDate::Epoch(1_700_000_000.0));
    assert_eq!(gallery.entries().len(), 1);
}

#[test]
fn failure_releases_single_flight() {
    let (mut pool, source, sink, gallery) = setup();
    activate(&pool, &gallery);
    pool.run_until_stalled();
    source.respond(Err("offline"));
    pool.run_until_stalled();
    assert!(sink.items.borrow().is_empty());
    assert!(!gallery.is_loaded());
    assert_eq!(sink.log.borrow().last().map(String::as_str), Some("failed"));

    assert!(activate(&pool, &gallery));
    pool.run_until_stalled();
    assert_eq!(source.fetches.get(), 2);
    source.respond(Ok(r#"[{"date":"5"}, {"fname":"c.png"}]"#));
    pool.run_until_stalled();
    assert_eq!(sink.items.borrow().len(), 1);
    assert_eq!(sink.items.borrow()[0].date, AssetDate::Unknown);
}

#[test]
fn non_array_manifest_is_a_failure() {
    let (mut pool, source, sink, gallery) = setup();
    activate(&pool, &gallery);
    pool.run_until_stalled();
    source.respond(Ok(r#"{"fname":"a.png"}"#));
    pool.run_until_stalled();
    assert!(sink.items.borrow().is_empty());
    gallery.deactivate();
    assert_eq!(sink.log.borrow().last().map(String::as_str), Some("hide"));
}
