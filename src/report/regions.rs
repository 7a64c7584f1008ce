use super::listings::ListingRecord;
use serde::Deserialize;
use std::io::Read;

/// One node of the region hierarchy. Declaration order in the configuration
/// file is load-bearing: it fixes both the table of contents and the page
/// plan, so subregions are an ordered list rather than a map.
#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub name: String,
    /// Listing classification column this region matches against.
    pub region_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub ownership_types: Vec<String>,
    #[serde(default)]
    pub analyze: bool,
    #[serde(default)]
    pub subregions: Vec<Region>,
}

impl Region {
    pub fn carries(&self, ownership: &str) -> bool {
        self.ownership_types.iter().any(|o| o == ownership)
    }

    /// Whether a listing belongs to this region. Records missing the
    /// classification column are excluded, never matched by default.
    pub fn matches(&self, record: &ListingRecord) -> bool {
        match record.classification(&self.region_type) {
            Some(value) => self.labels.iter().any(|label| label == value),
            None => false,
        }
    }

    /// Subregions that participate in this ownership type's report. These
    /// gate the infographic spread regardless of their `analyze` flag.
    pub fn qualifying_subregions(&self, ownership: &str) -> Vec<&Region> {
        self.subregions
            .iter()
            .filter(|sub| sub.carries(ownership))
            .collect()
    }

    /// Subregions that receive their own section pages.
    pub fn analyzed_subregions(&self, ownership: &str) -> Vec<&Region> {
        self.subregions
            .iter()
            .filter(|sub| sub.analyze && sub.carries(ownership))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("failed to parse region configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The full report structure: ownership types in presentation order plus the
/// ordered top-level regions.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionBook {
    pub ownership_types: Vec<String>,
    pub regions: Vec<Region>,
}

impl RegionBook {
    pub fn from_json<R: Read>(reader: R) -> Result<Self, RegionError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// The single traversal contract shared by the pagination planner and
    /// the composer. Both passes consume exactly this sequence, which makes
    /// their page accounting identical by construction.
    ///
    /// Order: each ownership type opens with a banner, followed by every
    /// top-level region carrying it, each region immediately followed by its
    /// analyzed subregions. Deeper nesting is not walked.
    pub fn stops(&self) -> Vec<ReportStop<'_>> {
        let mut stops = Vec::new();
        for ownership in &self.ownership_types {
            stops.push(ReportStop::OwnershipBanner { ownership });
            for region in &self.regions {
                if !region.carries(ownership) {
                    continue;
                }
                stops.push(ReportStop::Section {
                    ownership,
                    region,
                    depth: SectionDepth::Region,
                });
                for subregion in region.analyzed_subregions(ownership) {
                    stops.push(ReportStop::Section {
                        ownership,
                        region: subregion,
                        depth: SectionDepth::Subregion,
                    });
                }
            }
        }
        stops
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionDepth {
    Region,
    Subregion,
}

/// One stop of the shared report traversal.
#[derive(Debug, Clone, Copy)]
pub enum ReportStop<'a> {
    OwnershipBanner {
        ownership: &'a str,
    },
    Section {
        ownership: &'a str,
        region: &'a Region,
        depth: SectionDepth,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> RegionBook {
        let config = r#"{
            "ownership_types": ["Single Family Residences", "Condominiums"],
            "regions": [
                {
                    "name": "Montgomery County",
                    "region_type": "County",
                    "labels": ["Montgomery"],
                    "ownership_types": ["Single Family Residences", "Condominiums"],
                    "analyze": true,
                    "subregions": [
                        {
                            "name": "Bethesda",
                            "region_type": "City",
                            "labels": ["Bethesda"],
                            "ownership_types": ["Single Family Residences"],
                            "analyze": true
                        },
                        {
                            "name": "Rockville",
                            "region_type": "City",
                            "labels": ["Rockville"],
                            "ownership_types": ["Single Family Residences", "Condominiums"]
                        }
                    ]
                },
                {
                    "name": "Frederick County",
                    "region_type": "County",
                    "labels": ["Frederick"],
                    "ownership_types": ["Single Family Residences"]
                }
            ]
        }"#;
        RegionBook::from_json(config.as_bytes()).expect("sample config parses")
    }

    #[test]
    fn traversal_follows_declaration_order() {
        let book = sample_book();
        let described: Vec<String> = book
            .stops()
            .iter()
            .map(|stop| match stop {
                ReportStop::OwnershipBanner { ownership } => format!("banner:{ownership}"),
                ReportStop::Section { region, depth, .. } => match depth {
                    SectionDepth::Region => format!("region:{}", region.name),
                    SectionDepth::Subregion => format!("sub:{}", region.name),
                },
            })
            .collect();

        assert_eq!(
            described,
            vec![
                "banner:Single Family Residences",
                "region:Montgomery County",
                "sub:Bethesda",
                "region:Frederick County",
                "banner:Condominiums",
                "region:Montgomery County",
            ]
        );
    }

    #[test]
    fn qualifying_ignores_analyze_but_respects_ownership() {
        let book = sample_book();
        let montgomery = &book.regions[0];
        let sfr = montgomery.qualifying_subregions("Single Family Residences");
        assert_eq!(sfr.len(), 2, "both subregions carry SFR");
        let condo = montgomery.qualifying_subregions("Condominiums");
        assert_eq!(condo.len(), 1);
        assert_eq!(condo[0].name, "Rockville");
        assert!(montgomery.analyzed_subregions("Condominiums").is_empty());
    }

    #[test]
    fn missing_classification_never_matches() {
        let book = sample_book();
        let record = ListingRecord {
            list_date: None,
            off_market_date: None,
            settled_date: None,
            agreement_date: None,
            status: super::super::listings::ListingStatus::Active,
            ownership: None,
            list_price: None,
            sold_price: None,
            days_on_market: None,
            classifications: std::collections::HashMap::new(),
        };
        assert!(!book.regions[0].matches(&record));
    }
}
