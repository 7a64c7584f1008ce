use clap::{Args, Parser, Subcommand};
use market_report::config::AppConfig;
use market_report::error::AppError;
use market_report::report::compose::{InfographicPanel, RenderError, Renderer, ReportComposer};
use market_report::report::export::{metrics_csv_path, write_metrics_csv};
use market_report::report::layout::PanelSlot;
use market_report::report::listings::{read_listings, ListingRecord};
use market_report::report::metrics::{generate_metrics, MetricsTable};
use market_report::report::pagination;
use market_report::report::regions::{RegionBook, ReportStop};
use market_report::telemetry;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Market Report Planner",
    about = "Compute the metrics, pagination plan, and panel layouts of an annual market report",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the pagination plan (TOC with resolved page numbers) as JSON
    Plan(PlanArgs),
    /// Write per-(region, ownership) metrics tables as CSV diagnostics
    Metrics(MetricsArgs),
    /// Print a page-by-page outline of the composed report
    Outline(PlanArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV export of listing records
    #[arg(long)]
    listings: PathBuf,
    /// JSON region hierarchy configuration
    #[arg(long)]
    regions: PathBuf,
    /// Reporting year covered by the annual rollups
    #[arg(long)]
    year: i32,
}

#[derive(Args, Debug)]
struct PlanArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Pages preceding the report body (cover, copyright, contents)
    #[arg(long, default_value_t = 3)]
    front_matter_pages: u32,
}

#[derive(Args, Debug)]
struct MetricsArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Directory receiving one metrics CSV per (region, ownership) pair
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load();
    telemetry::init(&config.telemetry)?;

    match cli.command {
        Command::Plan(args) => print_plan(args),
        Command::Metrics(args) => export_metrics(args),
        Command::Outline(args) => print_outline(args),
    }
}

fn load_inputs(input: &InputArgs) -> Result<(Vec<ListingRecord>, RegionBook), AppError> {
    let listings = read_listings(File::open(&input.listings)?)?;
    let book = RegionBook::from_json(File::open(&input.regions)?)?;
    info!(
        listings = listings.len(),
        regions = book.regions.len(),
        ownership_types = book.ownership_types.len(),
        "loaded report inputs"
    );
    Ok((listings, book))
}

fn print_plan(args: PlanArgs) -> Result<(), AppError> {
    let (_, book) = load_inputs(&args.input)?;
    let plan = pagination::plan(&book, args.front_matter_pages);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn export_metrics(args: MetricsArgs) -> Result<(), AppError> {
    let (listings, book) = load_inputs(&args.input)?;
    std::fs::create_dir_all(&args.out_dir)?;

    let mut written = 0usize;
    for stop in book.stops() {
        if let ReportStop::Section {
            ownership, region, ..
        } = stop
        {
            let table = generate_metrics(&listings, args.input.year, Some(ownership), Some(region));
            let path = metrics_csv_path(&args.out_dir, &region.name, ownership);
            write_metrics_csv(&table, File::create(&path)?)?;
            info!(path = %path.display(), "wrote metrics table");
            written += 1;
        }
    }

    info!(written, "metrics export finished");
    Ok(())
}

fn print_outline(args: PlanArgs) -> Result<(), AppError> {
    let (listings, book) = load_inputs(&args.input)?;
    let composer = ReportComposer::new(&listings, &book, args.input.year);

    let stdout = std::io::stdout();
    let mut renderer = OutlineRenderer {
        out: stdout.lock(),
        page: args.front_matter_pages,
    };
    let summary = composer.compose(&mut renderer);
    info!(
        rendered = summary.sections_rendered,
        skipped = summary.sections_skipped,
        "outline complete"
    );
    Ok(())
}

/// Text stand-in for the PDF renderer: prints one line per page block while
/// consuming the same page counts the planner predicts.
struct OutlineRenderer<W: Write> {
    out: W,
    page: u32,
}

impl<W: Write> Renderer for OutlineRenderer<W> {
    fn ownership_banner(&mut self, ownership: &str) -> Result<(), RenderError> {
        writeln!(self.out, "p{:<4} BANNER  {ownership}", self.page)?;
        self.page += pagination::BANNER_PAGES;
        Ok(())
    }

    fn infographic_spread(
        &mut self,
        ownership: &str,
        region: &str,
        slots: &[PanelSlot],
        panels: &[InfographicPanel],
    ) -> Result<(), RenderError> {
        writeln!(
            self.out,
            "p{:<4} SPREAD  {region} | {ownership} ({} panels, diameter {:.1})",
            self.page,
            panels.len(),
            slots.first().map(|slot| slot.diameter).unwrap_or_default(),
        )?;
        self.page += 1;
        Ok(())
    }

    fn market_summary(
        &mut self,
        ownership: &str,
        region: &str,
        _metrics: &MetricsTable,
    ) -> Result<(), RenderError> {
        writeln!(self.out, "p{:<4} SUMMARY {region} | {ownership}", self.page)?;
        self.page += pagination::SUMMARY_PAGES;
        Ok(())
    }

    fn chart_pages(
        &mut self,
        ownership: &str,
        region: &str,
        _metrics: &MetricsTable,
    ) -> Result<(), RenderError> {
        writeln!(
            self.out,
            "p{:<4} CHARTS  {region} | {ownership} ({} pages)",
            self.page,
            pagination::CHART_PAGES
        )?;
        self.page += pagination::CHART_PAGES;
        Ok(())
    }
}
