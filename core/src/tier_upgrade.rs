use std::collections::HashMap;
use std::hash::Hash;

use crate::tiers::{Tier, TierUrls};

/// Which proximity watcher an element is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Watcher {
    Near,
    Close,
}

/// Near watcher: anything inside the widened root counts.
pub fn near_fires(is_intersecting: bool, ratio: f64) -> bool {
    is_intersecting || ratio > 0.0
}

/// Close watcher: requires a visible sliver beyond rounding noise.
pub fn close_fires(is_intersecting: bool, ratio: f64) -> bool {
    is_intersecting || ratio > 0.05
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierLoad {
    pub tier: Tier,
    pub url: String,
}

/// Outcome of a watcher firing: an off-screen load to start (if any) and the
/// watchers the element must be detached from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TierStep {
    pub load: Option<TierLoad>,
    pub unobserve: Vec<Watcher>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Idle,
    Loading,
    Settled,
}

#[derive(Clone, Debug)]
struct TierRecord {
    urls: TierUrls,
    current: Tier,
    lq: Stage,
    hq: Stage,
    near: bool,
    close: bool,
}

impl TierRecord {
    fn stage_mut(&mut self, tier: Tier) -> Option<&mut Stage> {
        match tier {
            Tier::Ulq => None,
            Tier::Lq => Some(&mut self.lq),
            Tier::Hq => Some(&mut self.hq),
        }
    }
}

/// Per-item upgrade bookkeeping. The displayed tier never decreases.
#[derive(Debug)]
pub struct TierUpgrades<K> {
    items: HashMap<K, TierRecord>,
}

impl<K> Default for TierUpgrades<K> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> TierUpgrades<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `key` at ULQ and returns the URL to paint eagerly.
    pub fn register(&mut self, key: K, urls: TierUrls) -> String {
        let initial = urls.ulq.clone();
        self.items.insert(
            key,
            TierRecord {
                urls,
                current: Tier::Ulq,
                lq: Stage::Idle,
                hq: Stage::Idle,
                near: true,
                close: true,
            },
        );
        initial
    }

    pub fn on_near(&mut self, key: &K) -> TierStep {
        let Some(record) = self.items.get_mut(key) else {
            return TierStep::default();
        };
        if !record.near {
            return TierStep::default();
        }
        record.near = false;
        let load = if record.lq == Stage::Idle && record.current == Tier::Ulq {
            record.lq = Stage::Loading;
            Some(TierLoad {
                tier: Tier::Lq,
                url: record.urls.lq.clone(),
            })
        } else {
            None
        };
        TierStep {
            load,
            unobserve: vec![Watcher::Near],
        }
    }

    /// Jumps straight to HQ and cancels any pending LQ upgrade.
    pub fn on_close(&mut self, key: &K) -> TierStep {
        let Some(record) = self.items.get_mut(key) else {
            return TierStep::default();
        };
        if !record.close {
            return TierStep::default();
        }
        record.close = false;
        let mut unobserve = vec![Watcher::Close];
        if record.near {
            record.near = false;
            unobserve.push(Watcher::Near);
        }
        let load = if record.hq == Stage::Idle && record.current < Tier::Hq {
            record.hq = Stage::Loading;
            record.lq = Stage::Settled;
            Some(TierLoad {
                tier: Tier::Hq,
                url: record.urls.hq.clone(),
            })
        } else {
            None
        };
        TierStep { load, unobserve }
    }

    /// Applies a finished off-screen load. Returns the URL to swap into the
    /// visible element, or `None` when the result is stale or unrequested.
    pub fn on_loaded(&mut self, key: &K, tier: Tier) -> Option<String> {
        let record = self.items.get_mut(key)?;
        let stage = record.stage_mut(tier)?;
        if *stage != Stage::Loading {
            return None;
        }
        *stage = Stage::Settled;
        if tier <= record.current {
            return None;
        }
        record.current = tier;
        if tier == Tier::Hq {
            record.lq = Stage::Settled;
        }
        Some(record.urls.get(tier).to_string())
    }

    /// Failed loads are abandoned; the element keeps its current tier.
    pub fn on_failed(&mut self, key: &K, tier: Tier) {
        if let Some(stage) = self
            .items
            .get_mut(key)
            .and_then(|record| record.stage_mut(tier))
        {
            *stage = Stage::Settled;
        }
    }

    /// Drops the record and reports which watchers were still attached.
    pub fn remove(&mut self, key: &K) -> Vec<Watcher> {
        let Some(record) = self.items.remove(key) else {
            return Vec::new();
        };
        let mut watchers = Vec::new();
        if record.near {
            watchers.push(Watcher::Near);
        }
        if record.close {
            watchers.push(Watcher::Close);
        }
        watchers
    }

    pub fn tier(&self, key: &K) -> Option<Tier> {
        self.items.get(key).map(|record| record.current)
    }

    pub fn is_watching(&self, key: &K, watcher: Watcher) -> bool {
        self.items.get(key).is_some_and(|record| match watcher {
            Watcher::Near => record.near,
            Watcher::Close => record.close,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
