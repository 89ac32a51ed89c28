use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use vizpro::compare::comparison_name;
use vizpro::config::AppConfig;
use vizpro::csv_reader;
use vizpro::export::{report_name, try_export, ExportAdapter, FileExporter};
use vizpro::graph::{render_chart, render_comparison};
use vizpro::parser::{parse_filters, parse_request};
use vizpro::{ChartRequest, OutputFormat, PipelineError, RenderOptions, Session};

#[derive(Parser, Debug)]
#[command(name = "vizpro")]
#[command(about = "Explore tabular sales data: charts, comparisons, insights and forecasts", long_about = None)]
struct Args {
    /// CSV file to analyse, or '-' to read from stdin
    input: String,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Keep rows whose COL is one of the listed values (repeatable)
    #[arg(long = "filter", value_name = "COL=V1,V2")]
    filters: Vec<String>,

    /// Fail instead of falling back to the unfiltered data when a filter matches nothing
    #[arg(long)]
    no_fallback: bool,

    /// Chart request, e.g. 'bar(x: Region, y: Sales)'
    #[arg(long, value_name = "REQUEST")]
    chart: Option<String>,

    /// Two chart requests rendered side by side
    #[arg(long, num_args = 2, value_names = ["LEFT", "RIGHT"])]
    compare: Option<Vec<String>>,

    /// Print summary insights
    #[arg(long)]
    insights: bool,

    /// Save an insights report
    #[arg(long)]
    report: bool,

    /// Save the active (filtered) rows as CSV and Excel
    #[arg(long)]
    export_data: bool,

    /// Numeric column to forecast
    #[arg(long, value_name = "COLUMN")]
    forecast: Option<String>,

    /// Number of periods to forecast
    #[arg(long, default_value_t = 3)]
    horizon: usize,

    /// Write the rendered chart here instead of the charts directory
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = AppConfig::load_or_default(args.config.as_deref())?;

    let raw = if args.input == "-" {
        csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?
    } else {
        csv_reader::read_csv_from_path(Path::new(&args.input))?
    };
    let mut session = Session::new(raw).context("Cannot analyse input")?;

    if !args.filters.is_empty() {
        let spec = parse_filters(&args.filters)?;
        let total = session.baseline().len();
        match session.apply_filter(spec) {
            Ok(view) => info!("Filter kept {} of {} rows", view.len(), total),
            Err(err @ PipelineError::NoDataAfterFilter { .. }) if !args.no_fallback => {
                warn!("{}; using the unfiltered data", err)
            }
            Err(err) => return Err(err.into()),
        }
    }

    let mut render_options = config.render.clone();
    if let Some(format) = args.output.as_deref().and_then(OutputFormat::from_path) {
        render_options.format = format;
    }
    let exporter = FileExporter::new(config.export.clone());
    let mut failed = false;

    if let Some(text) = &args.chart {
        if let Err(err) = run_chart(&session, text, &render_options, &exporter, args.output.as_deref()) {
            error!("{:#}", err);
            failed = true;
        }
    }

    if let Some(requests) = &args.compare {
        if let Err(err) = run_compare(&session, requests, &render_options, &exporter, args.output.as_deref()) {
            error!("{:#}", err);
            failed = true;
        }
    }

    if args.insights || args.report {
        let report = session.summarize();
        if args.insights {
            if report.is_empty() {
                println!("No insights available for this dataset.");
            }
            for line in report.lines() {
                println!("{}", line);
            }
        }
        if args.report {
            let now = Local::now();
            let text = report.to_report_text(now);
            let format = config.export.report_format;
            try_export("report", || exporter.export_report_as(&report_name(now), &text, format));
        }
    }

    if args.export_data {
        try_export("filtered data", || exporter.export_table("filtered_data", session.view()));
        try_export("filtered workbook", || exporter.export_table_xlsx("filtered_data", session.view()));
    }

    if let Some(column) = &args.forecast {
        match session.forecast(column, args.horizon, &config.forecast) {
            Ok(forecast) => {
                let values: Vec<String> = forecast.predicted.iter().map(|v| format!("{:.2}", v)).collect();
                println!("Forecast for {} ({} periods): {}", forecast.column, args.horizon, values.join(", "));
                match render_chart(&forecast.to_chart(), &render_options) {
                    Ok(bytes) => {
                        let name = format!("forecast_{}", forecast.column);
                        try_export("forecast chart", || {
                            exporter.export_chart(&name, &bytes, render_options.format)
                        });
                    }
                    Err(err) => warn!("Could not draw forecast chart: {:#}", err),
                }
            }
            Err(err) => {
                error!("Forecast failed. Make sure data is numeric and time-ordered: {}", err);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn chart_name(request: &ChartRequest) -> String {
    format!("{}_{}_{}", request.kind.label().to_lowercase(), request.x, request.y)
}

fn run_chart(
    session: &Session,
    text: &str,
    options: &RenderOptions,
    exporter: &FileExporter,
    output: Option<&Path>,
) -> Result<()> {
    let request = parse_request(text)?;
    let spec = session.render(&request)?;
    info!("{}", spec.title);
    let bytes = render_chart(&spec, options).context("Failed to render chart")?;
    deliver(&bytes, &chart_name(&request), options.format, exporter, output)
}

fn run_compare(
    session: &Session,
    requests: &[String],
    options: &RenderOptions,
    exporter: &FileExporter,
    output: Option<&Path>,
) -> Result<()> {
    let [left, right] = requests else {
        anyhow::bail!("--compare needs exactly two chart requests");
    };
    let left = parse_request(left).context("Chart 1")?;
    let right = parse_request(right).context("Chart 2")?;
    let comparison = session.compare(&left, &right)?;
    info!("Compared '{}' with '{}'", comparison.left.title, comparison.right.title);
    let bytes = render_comparison(&comparison, options).context("Failed to render comparison")?;
    deliver(&bytes, &comparison_name(&left, &right), options.format, exporter, output)
}

/// Write to `output` when given; otherwise hand the bytes to the exporter.
/// Only an explicit output path turns a write failure into an error.
fn deliver(
    bytes: &[u8],
    name: &str,
    format: OutputFormat,
    exporter: &FileExporter,
    output: Option<&Path>,
) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Saved chart to {}", path.display());
        }
        None => {
            try_export("chart", || exporter.export_chart(name, bytes, format));
        }
    }
    Ok(())
}
