use super::layout::{circle_layout, PanelSlot};
use super::listings::ListingRecord;
use super::metrics::{generate_metrics, Metric, MetricsTable, PeriodKey};
use super::pagination::PANELS_PER_SPREAD;
use super::regions::{Region, RegionBook, ReportStop};
use serde::Serialize;
use tracing::{debug, error, info};

/// Drawing surface geometry for an infographic spread, in page units.
const SPREAD_FRAME: (f64, f64, f64, f64) = (10.0, 50.0, 190.0, 225.0);
const SPREAD_GUTTER: f64 = 5.0;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("io error while drawing: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Headline annual figures for one subregion's info-panel.
#[derive(Debug, Clone, Serialize)]
pub struct InfographicPanel {
    pub name: String,
    pub homes_sold: Option<f64>,
    pub homes_sold_yoy: Option<f64>,
    pub average_days_on_market: Option<f64>,
    pub average_days_on_market_yoy: Option<f64>,
    pub median_sale_price: Option<f64>,
    pub median_sale_price_yoy: Option<f64>,
}

/// The rendering collaborator. Implementations draw pages from the computed
/// values and coordinates they are handed; each call consumes a fixed number
/// of pages (banner 1, spread 1, summary 1, charts 3), which is what lets
/// the pagination planner predict page numbers without rendering.
pub trait Renderer {
    fn ownership_banner(&mut self, ownership: &str) -> Result<(), RenderError>;

    fn infographic_spread(
        &mut self,
        ownership: &str,
        region: &str,
        slots: &[PanelSlot],
        panels: &[InfographicPanel],
    ) -> Result<(), RenderError>;

    fn market_summary(
        &mut self,
        ownership: &str,
        region: &str,
        metrics: &MetricsTable,
    ) -> Result<(), RenderError>;

    fn chart_pages(
        &mut self,
        ownership: &str,
        region: &str,
        metrics: &MetricsTable,
    ) -> Result<(), RenderError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComposeSummary {
    pub sections_rendered: usize,
    pub sections_skipped: usize,
}

/// Walks the shared traversal and hands each stop's computed metrics,
/// layouts, and titles to the renderer. A failure inside one stop is logged
/// and skipped; the rest of the report continues.
pub struct ReportComposer<'a> {
    records: &'a [ListingRecord],
    book: &'a RegionBook,
    report_year: i32,
}

impl<'a> ReportComposer<'a> {
    pub fn new(records: &'a [ListingRecord], book: &'a RegionBook, report_year: i32) -> Self {
        Self {
            records,
            book,
            report_year,
        }
    }

    pub fn compose<R: Renderer>(&self, renderer: &mut R) -> ComposeSummary {
        let mut summary = ComposeSummary::default();

        for stop in self.book.stops() {
            let (result, ownership, name) = match stop {
                ReportStop::OwnershipBanner { ownership } => {
                    (renderer.ownership_banner(ownership), ownership, "")
                }
                ReportStop::Section {
                    ownership, region, ..
                } => (
                    self.render_section(renderer, ownership, region),
                    ownership,
                    region.name.as_str(),
                ),
            };

            match result {
                Ok(()) => summary.sections_rendered += 1,
                Err(err) => {
                    error!(ownership, region = name, %err, "skipping report section");
                    summary.sections_skipped += 1;
                }
            }
        }

        info!(
            rendered = summary.sections_rendered,
            skipped = summary.sections_skipped,
            "report composition finished"
        );
        summary
    }

    fn render_section<R: Renderer>(
        &self,
        renderer: &mut R,
        ownership: &str,
        region: &Region,
    ) -> Result<(), RenderError> {
        debug!(ownership, region = %region.name, "rendering section");

        let qualifying = region.qualifying_subregions(ownership);
        if qualifying.len() >= 3 {
            let (x, y, w, h) = SPREAD_FRAME;
            for chunk in spread_chunks(&qualifying) {
                let slots = circle_layout(x, y, w, h, chunk.len(), None, Some(SPREAD_GUTTER))
                    .map_err(|err| RenderError::Other(err.to_string()))?;
                let panels: Vec<InfographicPanel> = chunk
                    .iter()
                    .map(|subregion| self.panel_for(ownership, subregion))
                    .collect();
                renderer.infographic_spread(ownership, &region.name, &slots, &panels)?;
            }
        }

        let metrics = generate_metrics(self.records, self.report_year, Some(ownership), Some(region));
        renderer.market_summary(ownership, &region.name, &metrics)?;
        renderer.chart_pages(ownership, &region.name, &metrics)
    }

    fn panel_for(&self, ownership: &str, subregion: &Region) -> InfographicPanel {
        let metrics = generate_metrics(
            self.records,
            self.report_year,
            Some(ownership),
            Some(subregion),
        );
        let year = PeriodKey::Year(self.report_year);

        InfographicPanel {
            name: subregion.name.clone(),
            homes_sold: metrics.value(year, Metric::SoldListings),
            homes_sold_yoy: metrics.yoy(year, Metric::SoldListings),
            average_days_on_market: metrics.value(year, Metric::SoldAverageDaysOnMarket),
            average_days_on_market_yoy: metrics.yoy(year, Metric::SoldAverageDaysOnMarket),
            median_sale_price: metrics.value(year, Metric::SoldMedianSalePrice),
            median_sale_price_yoy: metrics.yoy(year, Metric::SoldMedianSalePrice),
        }
    }
}

/// Splits qualifying subregions into near-equal spreads. Splitting evenly
/// (rather than filling pages of 7 and leaving a remainder) keeps every
/// spread within the supported 3..=7 panel range whenever there are at
/// least 3 subregions in total.
pub fn spread_chunks<'s, 'r>(subregions: &'s [&'r Region]) -> Vec<&'s [&'r Region]> {
    if subregions.is_empty() {
        return Vec::new();
    }

    let pages = (subregions.len() - 1) / PANELS_PER_SPREAD + 1;
    let base = subregions.len() / pages;
    let remainder = subregions.len() % pages;

    let mut chunks = Vec::with_capacity(pages);
    let mut rest = subregions;
    for page in 0..pages {
        let take = if page < remainder { base + 1 } else { base };
        let (chunk, tail) = rest.split_at(take);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str) -> Region {
        Region {
            name: name.to_string(),
            region_type: "County".to_string(),
            labels: vec![name.to_string()],
            ownership_types: vec!["Single Family Residences".to_string()],
            analyze: false,
            subregions: Vec::new(),
        }
    }

    #[test]
    fn chunking_matches_planned_page_count_and_stays_supported() {
        let owned: Vec<Region> = (0..23).map(|i| region(&format!("R{i}"))).collect();
        for total in 3..=owned.len() {
            let refs: Vec<&Region> = owned.iter().take(total).collect();
            let chunks = spread_chunks(&refs);
            let expected_pages = (total - 1) / PANELS_PER_SPREAD + 1;
            assert_eq!(chunks.len(), expected_pages, "pages for {total} subregions");
            let replaced: usize = chunks.iter().map(|c| c.len()).sum();
            assert_eq!(replaced, total);
            for chunk in chunks {
                assert!(
                    (3..=7).contains(&chunk.len()),
                    "{total} subregions produced a spread of {}",
                    chunk.len()
                );
            }
        }
    }

    #[test]
    fn eight_subregions_split_four_and_four() {
        let owned: Vec<Region> = (0..8).map(|i| region(&format!("R{i}"))).collect();
        let refs: Vec<&Region> = owned.iter().collect();
        let sizes: Vec<usize> = spread_chunks(&refs).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 4]);
    }
}
