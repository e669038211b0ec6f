use std::fmt;

/// Display fidelity of an asset. Ordered so that upgrades compare with `>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Ulq,
    Lq,
    Hq,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Ulq => "ulq",
            Tier::Lq => "lq",
            Tier::Hq => "hq",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierUrls {
    pub ulq: String,
    pub lq: String,
    pub hq: String,
}

impl TierUrls {
    fn uniform(url: &str) -> Self {
        Self {
            ulq: url.to_string(),
            lq: url.to_string(),
            hq: url.to_string(),
        }
    }

    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Ulq => &self.ulq,
            Tier::Lq => &self.lq,
            Tier::Hq => &self.hq,
        }
    }
}

pub fn is_animated(fname: &str) -> bool {
    fname.to_ascii_lowercase().ends_with(".gif")
}

/// Static image tiers: `<base>/<token>/<file>` becomes `<base>/<token>_ulq/<file>`
/// and `<base>/<token>_lq/<file>`. Only the first `/<token>` segment is rewritten.
pub fn progressive_urls(url: &str, token: &str) -> TierUrls {
    let Some((base, file)) = url.rsplit_once('/') else {
        return TierUrls::uniform(url);
    };
    if token.is_empty() {
        return TierUrls::uniform(url);
    }
    let needle = format!("/{token}");
    TierUrls {
        ulq: format!("{}/{file}", base.replacen(&needle, &format!("/{token}_ulq"), 1)),
        lq: format!("{}/{file}", base.replacen(&needle, &format!("/{token}_lq"), 1)),
        hq: url.to_string(),
    }
}

/// Animated assets are represented by static posters living next to the
/// compact directory: `<dir>_posters_ulq/<stem>.png` and friends.
pub fn poster_urls(url: &str) -> TierUrls {
    let Some((base, file)) = url.rsplit_once('/') else {
        return TierUrls::uniform(url);
    };
    let stem = file_stem(file);
    TierUrls {
        ulq: format!("{base}_posters_ulq/{stem}.png"),
        lq: format!("{base}_posters_lq/{stem}.png"),
        hq: format!("{base}_posters/{stem}.png"),
    }
}

fn file_stem(file: &str) -> &str {
    match file.rfind('.') {
        Some(idx) if idx + 1 < file.len() => &file[..idx],
        _ => file,
    }
}

/// Directory conventions for one site deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    art_root: String,
    compact_root: String,
}

impl AssetPaths {
    pub fn new(art_root: &str, compact_root: &str) -> Self {
        Self {
            art_root: art_root.trim_end_matches('/').to_string(),
            compact_root: compact_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn full_url(&self, fname: &str) -> String {
        format!("{}/{fname}", self.art_root)
    }

    pub fn compact_url(&self, fname: &str) -> String {
        format!("{}/{fname}", self.compact_root)
    }

    /// Image shown first inside the viewer: animated assets go straight to the
    /// original since their compact variant is only a poster.
    pub fn preview_url(&self, fname: &str) -> String {
        if is_animated(fname) {
            self.full_url(fname)
        } else {
            self.compact_url(fname)
        }
    }

    pub fn compact_token(&self) -> &str {
        self.compact_root
            .rsplit('/')
            .next()
            .unwrap_or(self.compact_root.as_str())
    }

    pub fn tier_urls(&self, fname: &str) -> TierUrls {
        let url = self.compact_url(fname);
        if is_animated(fname) {
            poster_urls(&url)
        } else {
            progressive_urls(&url, self.compact_token())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_tiers_rewrite_compact_directory() {
        let urls = progressive_urls("/home/src/compact_art/sunset.jpg", "compact_art");
        assert_eq!(urls.ulq, "/home/src/compact_art_ulq/sunset.jpg");
        assert_eq!(urls.lq, "/home/src/compact_art_lq/sunset.jpg");
        assert_eq!(urls.hq, "/home/src/compact_art/sunset.jpg");
    }

    #[test]
    fn poster_tiers_use_png_stem() {
        let urls = poster_urls("/home/src/compact_art/loop.anim.GIF");
        assert_eq!(urls.ulq, "/home/src/compact_art_posters_ulq/loop.anim.png");
        assert_eq!(urls.lq, "/home/src/compact_art_posters_lq/loop.anim.png");
        assert_eq!(urls.hq, "/home/src/compact_art_posters/loop.anim.png");
    }

    #[test]
    fn unparsable_urls_fall_back_unchanged() {
        let urls = progressive_urls("sunset.jpg", "compact_art");
        assert_eq!(urls, TierUrls::uniform("sunset.jpg"));
        let urls = poster_urls("loop.gif");
        assert_eq!(urls, TierUrls::uniform("loop.gif"));
    }

    #[test]
    fn paths_dispatch_on_animation() {
        let paths = AssetPaths::new("/home/src/art/", "/home/src/compact_art");
        assert_eq!(paths.compact_token(), "compact_art");
        assert_eq!(paths.full_url("a.png"), "/home/src/art/a.png");
        assert_eq!(paths.preview_url("a.png"), "/home/src/compact_art/a.png");
        assert_eq!(paths.preview_url("b.gif"), "/home/src/art/b.gif");
        assert_eq!(
            paths.tier_urls("b.gif").ulq,
            "/home/src/compact_art_posters_ulq/b.png"
        );
        assert_eq!(
            paths.tier_urls("a.png").lq,
            "/home/src/compact_art_lq/a.png"
        );
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(Tier::Ulq < Tier::Lq);
        assert!(Tier::Lq < Tier::Hq);
        assert_eq!(Tier::Hq.to_string(), "hq");
    }
}
