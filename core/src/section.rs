/// Top-level page section selected by the location hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Home,
    Showcase,
    Processes,
    Commissions,
    Other,
}

pub const PROCESSES_CONTAINER_ID: &str = "processes_container";
pub const COMMISSIONS_CONTAINER_ID: &str = "commissions_container";

impl Section {
    pub fn from_hash(hash: &str) -> Self {
        match hash {
            "" | "#" | "#home" => Section::Home,
            "#showcase" => Section::Showcase,
            "#processes" => Section::Processes,
            "#commissions" => Section::Commissions,
            _ => Section::Other,
        }
    }
}

/// Which containers are shown for a section. Everything not listed is hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionLayout {
    pub gallery: bool,
    pub home: bool,
    pub processes: bool,
    pub commissions: bool,
}

impl From<Section> for SectionLayout {
    fn from(section: Section) -> Self {
        Self {
            gallery: section == Section::Showcase,
            home: section == Section::Home,
            processes: section == Section::Processes,
            commissions: section == Section::Commissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_mapping() {
        assert_eq!(Section::from_hash(""), Section::Home);
        assert_eq!(Section::from_hash("#"), Section::Home);
        assert_eq!(Section::from_hash("#showcase"), Section::Showcase);
        assert_eq!(Section::from_hash("#Showcase"), Section::Other);
        let layout = SectionLayout::from(Section::from_hash("#processes"));
        assert!(layout.processes && !layout.gallery && !layout.home && !layout.commissions);
    }
}
