pub mod compose;
pub mod export;
pub mod layout;
pub mod listings;
pub mod metrics;
pub mod pagination;
pub mod regions;

pub use compose::{ComposeSummary, InfographicPanel, RenderError, Renderer, ReportComposer};
pub use layout::{circle_layout, LayoutError, PanelSlot};
pub use listings::{read_listings, ListingError, ListingRecord, ListingStatus};
pub use metrics::{generate_metrics, window_snapshot, Metric, MetricsTable, PeriodKey, TimeWindow};
pub use pagination::{plan, PaginationPlan, TocEntry};
pub use regions::{Region, RegionBook, RegionError, ReportStop, SectionDepth};
