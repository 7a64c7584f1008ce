use super::regions::{Region, RegionBook, ReportStop, SectionDepth};
use serde::Serialize;

/// Page-cost model for every traversal stop. These constants are the single
/// source of truth for both the planner and the renderer contract; the
/// composer's calls consume exactly these page counts.
pub const BANNER_PAGES: u32 = 1;
pub const SUMMARY_PAGES: u32 = 1;
pub const CHART_PAGES: u32 = 3;
pub const SECTION_PAGES: u32 = SUMMARY_PAGES + CHART_PAGES;
pub const PANELS_PER_SPREAD: usize = 7;

/// Infographic spread pages for a section: one per seven qualifying
/// subregions, and none at all below the three-panel threshold.
pub fn spread_pages(qualifying_subregions: usize) -> u32 {
    if qualifying_subregions >= 3 {
        ((qualifying_subregions - 1) / PANELS_PER_SPREAD + 1) as u32
    } else {
        0
    }
}

/// Total pages a section block occupies: its spreads followed by the fixed
/// summary-and-charts block.
pub fn section_pages(region: &Region, ownership: &str) -> u32 {
    spread_pages(region.qualifying_subregions(ownership).len()) + SECTION_PAGES
}

/// One table-of-contents entry with its resolved absolute page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub name: String,
    pub page: u32,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    fn new(name: &str, page: u32) -> Self {
        Self {
            name: name.to_string(),
            page,
            children: Vec::new(),
        }
    }
}

/// The predicted pagination of a full render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationPlan {
    pub entries: Vec<TocEntry>,
    /// First page after the report body.
    pub next_page: u32,
}

impl PaginationPlan {
    /// Flattens the entry tree in traversal order, for TOC line rendering
    /// and for comparison against an audited render pass.
    pub fn flattened(&self) -> Vec<(&str, u32)> {
        fn walk<'a>(entries: &'a [TocEntry], out: &mut Vec<(&'a str, u32)>) {
            for entry in entries {
                out.push((entry.name.as_str(), entry.page));
                walk(&entry.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.entries, &mut out);
        out
    }
}

/// Simulates the render pass over the shared traversal, recording the page
/// each entry will start on before advancing the counter by that entry's
/// cost. Pages count from `front_matter_pages`: the first banner lands
/// directly after the front matter.
pub fn plan(book: &RegionBook, front_matter_pages: u32) -> PaginationPlan {
    let mut page = front_matter_pages;
    let mut entries: Vec<TocEntry> = Vec::new();

    for stop in book.stops() {
        match stop {
            ReportStop::OwnershipBanner { ownership } => {
                entries.push(TocEntry::new(ownership, page));
                page += BANNER_PAGES;
            }
            ReportStop::Section {
                ownership,
                region,
                depth,
            } => {
                let entry = TocEntry::new(&region.name, page);
                page += section_pages(region, ownership);

                match depth {
                    SectionDepth::Region => {
                        if let Some(banner) = entries.last_mut() {
                            banner.children.push(entry);
                        }
                    }
                    SectionDepth::Subregion => {
                        if let Some(parent) = entries
                            .last_mut()
                            .and_then(|banner| banner.children.last_mut())
                        {
                            parent.children.push(entry);
                        }
                    }
                }
            }
        }
    }

    PaginationPlan {
        entries,
        next_page: page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_from(config: &str) -> RegionBook {
        RegionBook::from_json(config.as_bytes()).expect("test config parses")
    }

    #[test]
    fn flat_regions_follow_banner_and_block_costs() {
        // One banner page, then two 4-page sections: the second region
        // starts on page 5 when there is no front matter.
        let book = book_from(
            r#"{
                "ownership_types": ["Condominiums"],
                "regions": [
                    {"name": "Zero", "region_type": "County", "labels": ["Zero"],
                     "ownership_types": ["Condominiums"]},
                    {"name": "Alpha", "region_type": "County", "labels": ["Alpha"],
                     "ownership_types": ["Condominiums"]}
                ]
            }"#,
        );

        let plan = plan(&book, 0);
        assert_eq!(
            plan.flattened(),
            vec![("Condominiums", 0), ("Zero", 1), ("Alpha", 5)]
        );
        assert_eq!(plan.next_page, 9);
    }

    #[test]
    fn front_matter_offsets_every_entry() {
        let book = book_from(
            r#"{
                "ownership_types": ["Condominiums"],
                "regions": [
                    {"name": "Zero", "region_type": "County", "labels": ["Zero"],
                     "ownership_types": ["Condominiums"]}
                ]
            }"#,
        );
        let plan = plan(&book, 3);
        assert_eq!(plan.flattened(), vec![("Condominiums", 3), ("Zero", 4)]);
    }

    #[test]
    fn spread_pages_gate_on_three_subregions() {
        assert_eq!(spread_pages(0), 0);
        assert_eq!(spread_pages(2), 0);
        assert_eq!(spread_pages(3), 1);
        assert_eq!(spread_pages(7), 1);
        assert_eq!(spread_pages(8), 2);
        assert_eq!(spread_pages(15), 3);
    }

    #[test]
    fn subregions_nest_under_their_region_with_spread_offset() {
        let book = book_from(
            r#"{
                "ownership_types": ["Single Family Residences"],
                "regions": [
                    {"name": "County A", "region_type": "County", "labels": ["A"],
                     "ownership_types": ["Single Family Residences"],
                     "subregions": [
                        {"name": "S1", "region_type": "City", "labels": ["S1"],
                         "ownership_types": ["Single Family Residences"], "analyze": true},
                        {"name": "S2", "region_type": "City", "labels": ["S2"],
                         "ownership_types": ["Single Family Residences"], "analyze": true},
                        {"name": "S3", "region_type": "City", "labels": ["S3"],
                         "ownership_types": ["Single Family Residences"]}
                     ]}
                ]
            }"#,
        );

        // Banner page 0; County A starts at 1 and costs 1 spread page
        // (3 qualifying subregions) + 4; S1 starts at 6, S2 at 10.
        let plan = plan(&book, 0);
        assert_eq!(
            plan.flattened(),
            vec![
                ("Single Family Residences", 0),
                ("County A", 1),
                ("S1", 6),
                ("S2", 10),
            ]
        );

        let county = &plan.entries[0].children[0];
        assert_eq!(county.children.len(), 2, "only analyzed subregions listed");
    }

    #[test]
    fn ownership_gating_skips_regions_without_the_type() {
        let book = book_from(
            r#"{
                "ownership_types": ["Condominiums", "Co-ops"],
                "regions": [
                    {"name": "Condo Only", "region_type": "County", "labels": ["X"],
                     "ownership_types": ["Condominiums"]},
                    {"name": "Both", "region_type": "County", "labels": ["Y"],
                     "ownership_types": ["Condominiums", "Co-ops"]}
                ]
            }"#,
        );

        let plan = plan(&book, 0);
        assert_eq!(
            plan.flattened(),
            vec![
                ("Condominiums", 0),
                ("Condo Only", 1),
                ("Both", 5),
                ("Co-ops", 9),
                ("Both", 10),
            ]
        );
    }
}
