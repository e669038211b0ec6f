//! `?viewer=<fname>` deep links and the history policy around opening and
//! closing a viewer. Everything works on absolute hrefs so the runtime only
//! has to hand over `location.href` and apply the returned operation.

use url::Url;

pub const VIEWER_PARAM: &str = "viewer";

/// The first non-empty `viewer` value, decoded.
pub fn viewer_param(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let value = url
        .query_pairs()
        .find(|(key, _)| key == VIEWER_PARAM)
        .map(|(_, value)| value.into_owned())?;
    (!value.is_empty()).then_some(value)
}

/// Sets `viewer=<fname>` in place of the first occurrence, dropping any
/// others. Other parameters and the fragment are kept.
pub fn with_viewer(href: &str, fname: &str) -> Option<String> {
    let mut url = Url::parse(href).ok()?;
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut placed = false;
    pairs.retain_mut(|(key, value)| {
        if key != VIEWER_PARAM {
            return true;
        }
        if placed {
            return false;
        }
        *value = fname.to_string();
        placed = true;
        true
    });
    if !placed {
        pairs.push((VIEWER_PARAM.to_string(), fname.to_string()));
    }
    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    Some(url.into())
}

pub fn without_viewer(href: &str) -> Option<String> {
    let mut url = Url::parse(href).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(key, _)| key != VIEWER_PARAM)
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    }
    Some(url.into())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenOrigin {
    /// Click or keyboard inside the page.
    User,
    /// Initial load or popstate with a `viewer` parameter.
    Url,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryOp {
    Push(String),
    Replace(String),
    Back,
    None,
}

pub fn history_on_open(href: &str, fname: &str, origin: OpenOrigin) -> HistoryOp {
    match origin {
        OpenOrigin::User => with_viewer(href, fname).map_or(HistoryOp::None, HistoryOp::Push),
        OpenOrigin::Url => {
            if viewer_param(href).as_deref() == Some(fname) {
                return HistoryOp::None;
            }
            with_viewer(href, fname).map_or(HistoryOp::None, HistoryOp::Replace)
        }
    }
}

/// Gallery navigation inside an open viewer never adds history entries.
pub fn history_on_navigate(href: &str, fname: &str) -> HistoryOp {
    with_viewer(href, fname).map_or(HistoryOp::None, HistoryOp::Replace)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseAction {
    pub history: HistoryOp,
    /// `false` when teardown is left to the popstate the history op causes.
    pub destroy_now: bool,
}

pub fn history_on_close(href: &str, opened_via_push: bool) -> CloseAction {
    let has_param = viewer_param(href).is_some();
    if opened_via_push && has_param {
        return CloseAction {
            history: HistoryOp::Back,
            destroy_now: false,
        };
    }
    let history = if has_param {
        without_viewer(href).map_or(HistoryOp::None, HistoryOp::Replace)
    } else {
        HistoryOp::None
    };
    CloseAction {
        history,
        destroy_now: true,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteAction {
    Open(String),
    Destroy,
    /// Tear the active viewer down, then open the named file from the URL.
    Reopen(String),
    None,
}

/// Reconciles the `viewer` parameter with the active viewer on load and
/// popstate.
pub fn route_viewer(param: Option<&str>, active: Option<&str>) -> RouteAction {
    match (param, active) {
        (Some(fname), None) => RouteAction::Open(fname.to_string()),
        (None, Some(_)) => RouteAction::Destroy,
        (Some(fname), Some(current)) if fname != current => RouteAction::Reopen(fname.to_string()),
        _ => RouteAction::None,
    }
}

/// The single active-viewer slot. Claiming while occupied hands back the
/// previous handle so the caller can force-close it.
#[derive(Debug)]
pub struct ViewerSlot<H> {
    next_token: u64,
    active: Option<(u64, H)>,
}

impl<H> Default for ViewerSlot<H> {
    fn default() -> Self {
        Self {
            next_token: 1,
            active: None,
        }
    }
}

impl<H> ViewerSlot<H> {
    pub fn claim(&mut self, handle: H) -> (u64, Option<H>) {
        let token = self.next_token;
        self.next_token += 1;
        let prior = self.active.replace((token, handle)).map(|(_, prior)| prior);
        (token, prior)
    }

    /// Clears the slot only if `token` still owns it.
    pub fn release(&mut self, token: u64) -> Option<H> {
        match &self.active {
            Some((owner, _)) if *owner == token => self.active.take().map(|(_, handle)| handle),
            _ => None,
        }
    }

    pub fn owns(&self, token: u64) -> bool {
        matches!(&self.active, Some((owner, _)) if *owner == token)
    }

    pub fn take(&mut self) -> Option<H> {
        self.active.take().map(|(_, handle)| handle)
    }

    pub fn active(&self) -> Option<&H> {
        self.active.as_ref().map(|(_, handle)| handle)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
