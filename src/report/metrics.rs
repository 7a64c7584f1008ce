use super::listings::{ListingRecord, ListingStatus};
use super::regions::Region;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Every figure the report tables, charts, and infographics draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    ActiveListings,
    ActiveAverageListPrice,
    ActiveMedianListPrice,
    ActiveAverageDaysOnMarket,
    ActiveMedianDaysOnMarket,
    NewListings,
    NewAverageListPrice,
    NewMedianListPrice,
    NewAverageDaysOnMarket,
    NewMedianDaysOnMarket,
    SoldListings,
    SoldAverageListPrice,
    SoldMedianListPrice,
    SoldAverageSalePrice,
    SoldMedianSalePrice,
    SoldAverageDaysOnMarket,
    SoldMedianDaysOnMarket,
    SoldListPriceRatio,
    DomUnder500k,
    Dom500kTo750k,
    Dom750kTo1m,
    Dom1mTo1500k,
    Dom1500kTo2m,
    DomOver2m,
    MonthsOfSupply,
}

impl Metric {
    pub const fn ordered() -> [Self; 25] {
        [
            Self::ActiveListings,
            Self::ActiveAverageListPrice,
            Self::ActiveMedianListPrice,
            Self::ActiveAverageDaysOnMarket,
            Self::ActiveMedianDaysOnMarket,
            Self::NewListings,
            Self::NewAverageListPrice,
            Self::NewMedianListPrice,
            Self::NewAverageDaysOnMarket,
            Self::NewMedianDaysOnMarket,
            Self::SoldListings,
            Self::SoldAverageListPrice,
            Self::SoldMedianListPrice,
            Self::SoldAverageSalePrice,
            Self::SoldMedianSalePrice,
            Self::SoldAverageDaysOnMarket,
            Self::SoldMedianDaysOnMarket,
            Self::SoldListPriceRatio,
            Self::DomUnder500k,
            Self::Dom500kTo750k,
            Self::Dom750kTo1m,
            Self::Dom1mTo1500k,
            Self::Dom1500kTo2m,
            Self::DomOver2m,
            Self::MonthsOfSupply,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ActiveListings => "Active Listings",
            Self::ActiveAverageListPrice => "Active Average List Price",
            Self::ActiveMedianListPrice => "Active Median List Price",
            Self::ActiveAverageDaysOnMarket => "Active Average Days on Market",
            Self::ActiveMedianDaysOnMarket => "Active Median Days on Market",
            Self::NewListings => "New Listings",
            Self::NewAverageListPrice => "New Average List Price",
            Self::NewMedianListPrice => "New Median List Price",
            Self::NewAverageDaysOnMarket => "New Average Days on Market",
            Self::NewMedianDaysOnMarket => "New Median Days on Market",
            Self::SoldListings => "Sold Listings",
            Self::SoldAverageListPrice => "Sold Average List Price",
            Self::SoldMedianListPrice => "Sold Median List Price",
            Self::SoldAverageSalePrice => "Sold Average Sale Price",
            Self::SoldMedianSalePrice => "Sold Median Sale Price",
            Self::SoldAverageDaysOnMarket => "Sold Average Days on Market",
            Self::SoldMedianDaysOnMarket => "Sold Median Days on Market",
            Self::SoldListPriceRatio => "Sold/List Price Ratio",
            Self::DomUnder500k => "< $500k",
            Self::Dom500kTo750k => "$500k - $750k",
            Self::Dom750kTo1m => "$750k - $1M",
            Self::Dom1mTo1500k => "$1M - $1.5M",
            Self::Dom1500kTo2m => "$1.5M - $2M",
            Self::DomOver2m => "> $2M",
            Self::MonthsOfSupply => "Months of Supply",
        }
    }
}

/// Active-inventory price bands: (exclusive lower, inclusive upper, metric).
const PRICE_BANDS: [(f64, f64, Metric); 6] = [
    (0.0, 500_000.0, Metric::DomUnder500k),
    (500_000.0, 750_000.0, Metric::Dom500kTo750k),
    (750_000.0, 1_000_000.0, Metric::Dom750kTo1m),
    (1_000_000.0, 1_500_000.0, Metric::Dom1mTo1500k),
    (1_500_000.0, 2_000_000.0, Metric::Dom1500kTo2m),
    (2_000_000.0, 10_000_000.0, Metric::DomOver2m),
];

/// Half-open month interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

/// Key of one table row: a monthly window identified by its END date, or a
/// synthetic full-year rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodKey {
    Month(NaiveDate),
    Year(i32),
}

impl PeriodKey {
    /// The row exactly one calendar year earlier, the YoY comparison target.
    /// Window ends are always first-of-month dates, so shifting the year
    /// never produces an invalid day.
    pub fn prior_year(self) -> Option<Self> {
        match self {
            Self::Month(end) => end.with_year(end.year() - 1).map(Self::Month),
            Self::Year(year) => Some(Self::Year(year - 1)),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Month(end) => end.format("%Y-%m-%d").to_string(),
            Self::Year(year) => year.to_string(),
        }
    }
}

/// Metric values for one period. A missing key means undefined; the maps
/// never hold NaN or infinity.
#[derive(Debug, Clone, Default)]
pub struct MetricRow {
    values: BTreeMap<Metric, f64>,
    yoy: BTreeMap<Metric, f64>,
}

impl MetricRow {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn yoy(&self, metric: Metric) -> Option<f64> {
        self.yoy.get(&metric).copied()
    }

    fn insert(&mut self, metric: Metric, value: Option<f64>) {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.values.insert(metric, value);
        }
    }
}

/// Ordered period -> row table: the two annual rollups (current year first)
/// followed by 24 monthly rows in ascending order.
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    rows: Vec<(PeriodKey, MetricRow)>,
}

impl MetricsTable {
    pub fn periods(&self) -> impl Iterator<Item = PeriodKey> + '_ {
        self.rows.iter().map(|(key, _)| *key)
    }

    pub fn row(&self, key: PeriodKey) -> Option<&MetricRow> {
        self.rows
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, row)| row)
    }

    pub fn value(&self, key: PeriodKey, metric: Metric) -> Option<f64> {
        self.row(key).and_then(|row| row.value(metric))
    }

    pub fn yoy(&self, key: PeriodKey, metric: Metric) -> Option<f64> {
        self.row(key).and_then(|row| row.yoy(metric))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Summary statistics for one window (the per-month building block of the
/// table). Filters by ownership and region membership, then partitions the
/// survivors into the three lifecycle cohorts. Empty cohorts leave their
/// metrics undefined rather than zero, and nothing here can panic on empty
/// input.
pub fn window_snapshot(
    records: &[ListingRecord],
    window: TimeWindow,
    ownership: Option<&str>,
    region: Option<&Region>,
) -> MetricRow {
    let pool: Vec<&ListingRecord> = records
        .iter()
        .filter(|record| match ownership {
            Some(wanted) => record.ownership.as_deref() == Some(wanted),
            None => true,
        })
        .filter(|record| match region {
            Some(region) => region.matches(record),
            None => true,
        })
        .collect();

    // A listing is still active at the window end if it was listed before
    // the end and none of its exit dates precede the end. Missing exit
    // dates count as "has not left".
    let active: Vec<&ListingRecord> = pool
        .iter()
        .copied()
        .filter(|r| {
            r.list_date.is_some_and(|d| d < window.end)
                && r.off_market_date.map_or(true, |d| d >= window.end)
                && r.settled_date.map_or(true, |d| d >= window.end)
                && r.agreement_date.map_or(true, |d| d >= window.end)
        })
        .collect();

    let newly_listed: Vec<&ListingRecord> = pool
        .iter()
        .copied()
        .filter(|r| r.list_date.is_some_and(|d| window.contains(d)))
        .collect();

    let sold: Vec<&ListingRecord> = pool
        .iter()
        .copied()
        .filter(|r| {
            r.status == ListingStatus::Closed && r.settled_date.is_some_and(|d| window.contains(d))
        })
        .collect();

    let mut row = MetricRow::default();

    if !active.is_empty() {
        row.insert(Metric::ActiveListings, Some(active.len() as f64));
        let prices = collect(&active, |r| r.list_price);
        row.insert(Metric::ActiveAverageListPrice, mean(&prices).map(round0));
        row.insert(Metric::ActiveMedianListPrice, median(prices).map(round0));
        let dom = collect(&active, |r| r.days_on_market);
        row.insert(Metric::ActiveAverageDaysOnMarket, mean(&dom).map(round0));
        row.insert(Metric::ActiveMedianDaysOnMarket, median(dom).map(round0));

        for (lower, upper, metric) in PRICE_BANDS {
            let band_dom: Vec<f64> = active
                .iter()
                .filter(|r| r.list_price.is_some_and(|p| p > lower && p <= upper))
                .filter_map(|r| r.days_on_market)
                .collect();
            row.insert(metric, mean(&band_dom).map(round0));
        }
    }

    if !newly_listed.is_empty() {
        row.insert(Metric::NewListings, Some(newly_listed.len() as f64));
        let prices = collect(&newly_listed, |r| r.list_price);
        row.insert(Metric::NewAverageListPrice, mean(&prices).map(round0));
        row.insert(Metric::NewMedianListPrice, median(prices).map(round0));
        let dom = collect(&newly_listed, |r| r.days_on_market);
        row.insert(Metric::NewAverageDaysOnMarket, mean(&dom).map(round0));
        row.insert(Metric::NewMedianDaysOnMarket, median(dom).map(round0));
    }

    if !sold.is_empty() {
        row.insert(Metric::SoldListings, Some(sold.len() as f64));
        let list_prices = collect(&sold, |r| r.list_price);
        row.insert(Metric::SoldAverageListPrice, mean(&list_prices).map(round0));
        row.insert(Metric::SoldMedianListPrice, median(list_prices).map(round0));
        let sale_prices = collect(&sold, |r| r.sold_price);
        row.insert(Metric::SoldAverageSalePrice, mean(&sale_prices).map(round0));
        row.insert(Metric::SoldMedianSalePrice, median(sale_prices).map(round0));
        let dom = collect(&sold, |r| r.days_on_market);
        row.insert(Metric::SoldAverageDaysOnMarket, mean(&dom).map(round0));
        row.insert(Metric::SoldMedianDaysOnMarket, median(dom).map(round0));

        let ratios: Vec<f64> = sold
            .iter()
            .filter_map(|r| match (r.sold_price, r.list_price) {
                (Some(sold_price), Some(list_price)) if list_price != 0.0 => {
                    Some(sold_price / list_price).filter(|v| v.is_finite())
                }
                _ => None,
            })
            .collect();
        row.insert(
            Metric::SoldListPriceRatio,
            mean(&ratios).map(|m| round_to(m * 100.0, 2)),
        );
    }

    row
}

/// Full bi-annual table for one (region, ownership) pair: 24 monthly rows
/// across `report_year - 1` and `report_year`, trailing Months of Supply,
/// two annual rollup rows, and YoY deltas wherever the comparison row
/// exists.
pub fn generate_metrics(
    records: &[ListingRecord],
    report_year: i32,
    ownership: Option<&str>,
    region: Option<&Region>,
) -> MetricsTable {
    let windows = month_windows(report_year);

    let mut monthly: Vec<(PeriodKey, MetricRow)> = Vec::with_capacity(windows.len());
    let mut sold_counts: Vec<Option<f64>> = Vec::with_capacity(windows.len());

    for (index, window) in windows.iter().enumerate() {
        let mut row = window_snapshot(records, *window, ownership, region);
        sold_counts.push(row.value(Metric::SoldListings));

        // Trailing three-month absorption; the first two rows of the series
        // have no complete window.
        if index >= 2 {
            let supply = months_of_supply(
                row.value(Metric::ActiveListings),
                &sold_counts[index - 2..=index],
            );
            row.insert(Metric::MonthsOfSupply, supply);
        }

        monthly.push((PeriodKey::Month(window.end), row));
    }

    let current_window = year_window(report_year);
    let prior_window = year_window(report_year - 1);
    let mut current_row = window_snapshot(records, current_window, ownership, region);
    let mut prior_row = window_snapshot(records, prior_window, ownership, region);

    // Annual Months of Supply is the year-end (December) reading, not a
    // recomputation over the whole year.
    let december = |rows: &[(PeriodKey, MetricRow)], end: NaiveDate| {
        rows.iter()
            .find(|(key, _)| *key == PeriodKey::Month(end))
            .and_then(|(_, row)| row.value(Metric::MonthsOfSupply))
    };
    current_row.insert(
        Metric::MonthsOfSupply,
        december(&monthly, current_window.end),
    );
    prior_row.insert(Metric::MonthsOfSupply, december(&monthly, prior_window.end));

    let mut rows = Vec::with_capacity(monthly.len() + 2);
    rows.push((PeriodKey::Year(report_year), current_row));
    rows.push((PeriodKey::Year(report_year - 1), prior_row));
    rows.extend(monthly);

    apply_yoy(&mut rows);

    MetricsTable { rows }
}

fn apply_yoy(rows: &mut [(PeriodKey, MetricRow)]) {
    let keys: Vec<PeriodKey> = rows.iter().map(|(key, _)| *key).collect();

    for index in 0..rows.len() {
        let Some(prior_key) = keys[index].prior_year() else {
            continue;
        };
        let Some(prior_index) = keys.iter().position(|key| *key == prior_key) else {
            continue;
        };

        let deltas: Vec<(Metric, f64)> = {
            let current = &rows[index].1;
            let prior = &rows[prior_index].1;
            current
                .values
                .iter()
                .filter_map(|(metric, value)| {
                    prior
                        .value(*metric)
                        .and_then(|base| yoy_change(*value, base))
                        .map(|delta| (*metric, delta))
                })
                .collect()
        };

        for (metric, delta) in deltas {
            rows[index].1.yoy.insert(metric, delta);
        }
    }
}

/// Percent change against the prior-year value, rounded to one decimal.
/// A zero or missing base yields no delta; infinities are never emitted.
fn yoy_change(current: f64, base: f64) -> Option<f64> {
    if base == 0.0 {
        return None;
    }
    Some(round_to((current / base - 1.0) * 100.0, 1)).filter(|v| v.is_finite())
}

fn months_of_supply(active: Option<f64>, trailing_sold: &[Option<f64>]) -> Option<f64> {
    let active = active?;
    let mut sum = 0.0;
    for sold in trailing_sold {
        sum += (*sold)?;
    }
    if sum <= 0.0 {
        return None;
    }
    Some(round_to(3.0 * active / sum, 1)).filter(|v| v.is_finite())
}

/// The 24 consecutive month windows spanning the prior and current report
/// years, January through December each.
fn month_windows(report_year: i32) -> Vec<TimeWindow> {
    let mut windows = Vec::with_capacity(24);
    let mut start = first_of_month(report_year - 1, 1);
    for _ in 0..24 {
        let end = next_month(start);
        windows.push(TimeWindow { start, end });
        start = end;
    }
    windows
}

fn year_window(year: i32) -> TimeWindow {
    TimeWindow {
        start: first_of_month(year, 1),
        end: first_of_month(year + 1, 1),
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Day one of any month in any supported year is always representable.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn next_month(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        first_of_month(date.year() + 1, 1)
    } else {
        first_of_month(date.year(), date.month() + 1)
    }
}

fn collect(records: &[&ListingRecord], field: impl Fn(&ListingRecord) -> Option<f64>) -> Vec<f64> {
    records.iter().filter_map(|r| field(r)).collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64).filter(|v| v.is_finite())
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

fn round0(value: f64) -> f64 {
    value.round()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
