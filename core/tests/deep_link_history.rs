use showcase_core::{
    history_on_close, history_on_navigate, history_on_open, route_viewer, viewer_param, HistoryOp,
    OpenOrigin, RouteAction,
};

/// Minimal session history: a stack of hrefs and a cursor.
struct FakeHistory {
    entries: Vec<String>,
    index: usize,
}

impl FakeHistory {
    fn new(href: &str) -> Self {
        Self {
            entries: vec![href.to_string()],
            index: 0,
        }
    }

    fn href(&self) -> &str {
        &self.entries[self.index]
    }

    /// Applies the op; returns `true` when a popstate would fire.
    fn apply(&mut self, op: HistoryOp) -> bool {
        match op {
            HistoryOp::Push(href) => {
                self.entries.truncate(self.index + 1);
                self.entries.push(href);
                self.index += 1;
                false
            }
            HistoryOp::Replace(href) => {
                self.entries[self.index] = href;
                false
            }
            HistoryOp::Back => {
                self.index = self.index.saturating_sub(1);
                true
            }
            HistoryOp::None => false,
        }
    }
}

#[test]
fn user_open_then_close_goes_back() {
    let mut history = FakeHistory::new("https://site.test/home/#showcase");
    let op = history_on_open(history.href(), "a.png", OpenOrigin::User);
    assert!(!history.apply(op));
    assert_eq!(viewer_param(history.href()).as_deref(), Some("a.png"));

    let op = history_on_navigate(history.href(), "b.png");
    history.apply(op);
    assert_eq!(history.entries.len(), 2);
    assert_eq!(viewer_param(history.href()).as_deref(), Some("b.png"));

    let close = history_on_close(history.href(), true);
    assert!(!close.destroy_now);
    assert!(history.apply(close.history));
    assert_eq!(history.href(), "https://site.test/home/#showcase");
    assert_eq!(
        route_viewer(viewer_param(history.href()).as_deref(), Some("b.png")),
        RouteAction::Destroy
    );
}

#[test]
fn url_open_then_close_replaces() {
    let mut history = FakeHistory::new("https://site.test/home/?viewer=foo.png");
    let param = viewer_param(history.href());
    assert_eq!(
        route_viewer(param.as_deref(), None),
        RouteAction::Open("foo.png".into())
    );
    let op = history_on_open(history.href(), "foo.png", OpenOrigin::Url);
    assert_eq!(op, HistoryOp::None);

    let close = history_on_close(history.href(), false);
    assert!(close.destroy_now);
    assert!(!history.apply(close.history));
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.href(), "https://site.test/home/");
    assert_eq!(viewer_param(history.href()), None);
}

#[test]
fn close_without_param_just_destroys() {
    let close = history_on_close("https://site.test/", true);
    assert_eq!(close.history, HistoryOp::None);
    assert!(close.destroy_now);
}

#[test]
fn forward_to_other_file_reopens() {
    let href = "https://site.test/?viewer=next.png";
    assert_eq!(
        route_viewer(viewer_param(href).as_deref(), Some("prev.png")),
        RouteAction::Reopen("next.png".into())
    );
}
