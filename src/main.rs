use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use covidscope::{
    export::{write_detail, write_overview, OutputFormat},
    render::{with_retries, Dashboard, RenderFailure, DATA_UNAVAILABLE},
    Config, DisplayMode, ViewParams,
};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "COVID-19 region dashboards as chart-ready tables"
)]
struct Args {
    /// YAML config; built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Folder URL or local directory with the three time-series CSVs.
    #[arg(long, global = true)]
    source: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the configured views.
    Views,
    /// Cases, fatality rate and per-100k ranking over a region set.
    Overview {
        #[arg(long, default_value = "world")]
        view: String,
        /// Repeat to chart several regions; the view's defaults when omitted.
        #[arg(long = "region")]
        regions: Vec<String>,
        #[arg(long)]
        select_all: bool,
        /// Plot cases on a linear axis instead of log.
        #[arg(long)]
        linear: bool,
        #[arg(long, default_value = "./output")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Parquet)]
        format: Format,
    },
    /// Active, deaths and recovered of a single region.
    Detail {
        #[arg(long, default_value = "world")]
        view: String,
        #[arg(long)]
        region: Option<String>,
        #[arg(long, value_enum, default_value_t = Mode::Cumulative)]
        mode: Mode,
        #[arg(long, default_value = "./output")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Parquet)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Parquet,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Parquet => OutputFormat::Parquet,
            Format::Csv => OutputFormat::Csv,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Cumulative,
    NewCases,
}

impl From<Mode> for DisplayMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Cumulative => DisplayMode::Cumulative,
            Mode::NewCases => DisplayMode::NewCases,
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load(path).context("loading config")?,
        None => Config::default(),
    };
    if let Some(source) = &args.source {
        cfg.source = source.clone();
    }
    Ok(cfg)
}

/// Report a failed render the way the dashboard did and exit non-zero.
fn fail(err: RenderFailure) -> ! {
    let data_fetch = err.last.is_data_fetch();
    let message = err.user_message();
    error!(error = ?anyhow::Error::from(err), "render failed");
    if data_fetch {
        eprintln!("{}", DATA_UNAVAILABLE);
    }
    eprintln!("{}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;
    let attempts = cfg.render_attempts;

    match args.command {
        Command::Views => {
            for v in &cfg.views {
                let count = v
                    .regions
                    .as_ref()
                    .map_or_else(|| "all".to_string(), |r| r.len().to_string());
                println!("{:<12} {:<28} {} {}", v.key, v.title, count, v.unit_plural);
            }
        }
        Command::Overview {
            view,
            regions,
            select_all,
            linear,
            out,
            format,
        } => {
            let params = ViewParams {
                region_set: (!regions.is_empty()).then_some(regions),
                select_all,
                log_scale: !linear,
                ..ViewParams::default()
            };
            let dashboard = Dashboard::from_config(cfg).context("building dashboard")?;
            let (dash, key, params) = (&dashboard, view.as_str(), &params);
            let overview = match with_retries(attempts, move |_| dash.overview(key, params)).await {
                Ok(o) => o,
                Err(e) => fail(e),
            };
            let Some(overview) = overview else {
                println!("No region selected, nothing to chart.");
                return Ok(());
            };
            let paths = write_overview(&overview, &out, &view, format.into())?;
            info!(view = %view, regions = overview.regions.len(), "overview written");
            for p in paths {
                println!("{}", p.display());
            }
        }
        Command::Detail {
            view,
            region,
            mode,
            out,
            format,
        } => {
            let params = ViewParams {
                selected_single_region: region,
                display_mode: mode.into(),
                ..ViewParams::default()
            };
            let dashboard = Dashboard::from_config(cfg).context("building dashboard")?;
            let (dash, key, params) = (&dashboard, view.as_str(), &params);
            let detail = match with_retries(attempts, move |_| dash.detail(key, params)).await {
                Ok(d) => d,
                Err(e) => fail(e),
            };
            let Some(detail) = detail else {
                println!("Region is not part of view `{}`.", view);
                return Ok(());
            };
            let prefix = format!("{}_{}", view, detail.region.replace(' ', "_"));
            let path = write_detail(&detail, &out, &prefix, format.into())?;
            info!(view = %view, region = %detail.region, "detail written");
            println!("{}", path.display());
        }
    }
    Ok(())
}
