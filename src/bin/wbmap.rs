use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand, ValueEnum};
use num_format::Locale;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use wbmap_rs::chart::{self, ChartData};
use wbmap_rs::error::LOADING_MESSAGE;
use wbmap_rs::orchestrator::{DataOrchestrator, DataState, Status, ThreadSpawner};
use wbmap_rs::selection::Restored;
use wbmap_rs::store::{FileBackend, PROFILE_KEY, SystemClock};
use wbmap_rs::{
    Client, CountryCode, CountryDirectory, CountryProfile, DateSpec, Explorer, ExplorerConfig,
    FilterState, IndicatorSeries, MapAsset, PersistenceStore, ShapeElement, storage,
};

#[derive(Parser, Debug)]
#[command(
    name = "wbmap",
    version,
    about = "Explore World Bank country profiles through a filterable world map"
)]
struct Cli {
    /// JSON config file (all keys optional).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the persisted selection.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,
    /// World Bank API base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// SVG map whose shapes carry two-letter country ids. Defaults to every known country.
    #[arg(long, global = true)]
    map: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print one country profile without touching the saved selection.
    Profile {
        /// Two-letter country code (e.g., de)
        code: String,
    },
    /// Select a country on the map, load its data and save the selection.
    Select(SelectArgs),
    /// Show the saved selection and its cached profile.
    Restore,
    /// List the countries matching a search query and/or region.
    Filter {
        /// Case-insensitive substring of the name or code.
        #[arg(short, long, default_value = "")]
        query: String,
        /// Region chip (e.g., Africa, "North America", "All Regions").
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Replay the load for the saved selection.
    Retry(WaitArgs),
    /// Forget the saved selection and its cached profile.
    Clear,
    /// Fetch the indicator series of one country and save it, without selecting it.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Two-letter country code (e.g., br)
    code: String,
    /// Output file (format inferred by --format or extension).
    #[arg(long)]
    out: PathBuf,
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Indicator id; defaults to the configured one.
    #[arg(long)]
    indicator: Option<String>,
    /// Years ending at the current year; defaults to the configured window.
    #[arg(long)]
    years: Option<u32>,
}

#[derive(Args, Debug)]
struct WaitArgs {
    /// Seconds to wait for the API.
    #[arg(long, default_value_t = 60)]
    wait: u64,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct SelectArgs {
    /// Two-letter country code (e.g., ng)
    code: String,
    /// Write the indicator sparkline to this .svg path.
    #[arg(long)]
    chart: Option<PathBuf>,
    /// Save the indicator series to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    #[command(flatten)]
    wait: WaitArgs,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(p) => ExplorerConfig::load(p)?,
        None => ExplorerConfig::default(),
    };
    if let Some(dir) = &cli.store_dir {
        cfg.storage_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.base_url {
        cfg.base_url = url.clone();
    }
    cfg.validate()?;

    match &cli.cmd {
        Command::Profile { code } => cmd_profile(&cfg, code),
        Command::Filter { query, region } => cmd_filter(&cfg, &cli, query, region),
        Command::Select(args) => cmd_select(&cfg, &cli, args),
        Command::Restore => cmd_restore(&cfg, &cli),
        Command::Retry(args) => cmd_retry(&cfg, &cli, args),
        Command::Clear => cmd_clear(&cfg, &cli),
        Command::Export(args) => cmd_export(&cfg, args),
    }
}

fn parse_code(s: &str) -> Result<CountryCode> {
    CountryCode::parse(s).with_context(|| format!("invalid country code {:?}", s))
}

fn open_store(cfg: &ExplorerConfig) -> Arc<PersistenceStore> {
    let backend = FileBackend::new(cfg.storage_dir());
    let store = PersistenceStore::new(Box::new(backend), Arc::new(SystemClock))
        .with_ttl(PROFILE_KEY, chrono::Duration::days(cfg.profile_ttl_days));
    Arc::new(store)
}

fn build_explorer(cfg: &ExplorerConfig, cli: &Cli) -> Result<Explorer<ShapeElement>> {
    let directory = CountryDirectory::builtin();
    let map = match &cli.map {
        Some(path) => MapAsset::load(path, &cfg.palette).map_err(|e| {
            anyhow::anyhow!("{} ({})", e.user_message(), e)
        })?,
        None => {
            let mut codes: Vec<CountryCode> = wbmap_rs::directory::BUILTIN_COUNTRIES
                .iter()
                .filter_map(|r| CountryCode::parse(r.code).ok())
                .collect();
            codes.sort();
            MapAsset::from_codes(codes, &cfg.palette)
        }
    };
    let store = open_store(cfg);
    let client = Client::from_config(cfg)?;
    let orchestrator = DataOrchestrator::new(
        Arc::new(client),
        Box::new(ThreadSpawner),
        store.clone(),
        cfg.indicator_settings(),
    );
    Ok(Explorer::new(
        map.shapes,
        directory,
        store,
        orchestrator,
        cfg.palette,
    ))
}

fn print_profile(code: &CountryCode, p: &CountryProfile) {
    println!("{} ({})", p.name, code);
    println!("  capital:      {}", p.capital);
    println!("  region:       {}", p.region);
    println!("  income level: {}", p.income_level);
    println!("  coordinates:  {}, {}", p.latitude, p.longitude);
}

fn print_data(cfg: &ExplorerConfig, state: &DataState) {
    if let (Some(code), Some(p)) = (&state.code, &state.profile) {
        print_profile(code, p);
    }
    if let Some(series) = &state.chart
        && let Some(data) = ChartData::from_series(series, &cfg.indicator_label)
    {
        let first = data.labels.first().map(String::as_str).unwrap_or("");
        if let Some((year, v)) = data.latest() {
            println!(
                "  {}: {} ({}) across {}-{}",
                data.label,
                chart::compact_tick(v),
                year,
                first,
                year
            );
            println!("  latest value: {}", chart::format_whole(v, &Locale::en));
        }
    }
}

fn finish(cfg: &ExplorerConfig, explorer: &mut Explorer<ShapeElement>, wait: u64) -> Result<()> {
    if explorer.data().is_loading() {
        eprintln!("{}", LOADING_MESSAGE);
    }
    if !explorer.wait_idle(Duration::from_secs(wait)) {
        eprintln!("Still loading after {}s; partial results below.", wait);
    }
    let state = explorer.data();
    if state.status == Status::Error
        && let Some(err) = &state.error
        && err.is_user_facing()
    {
        bail!("{} ({})", err.user_message(), err);
    }
    print_data(cfg, state);
    Ok(())
}

fn cmd_profile(cfg: &ExplorerConfig, code: &str) -> Result<()> {
    let code = parse_code(code)?;
    let client = Client::from_config(cfg)?;
    let profile = client.fetch_profile(&code)?;
    print_profile(&code, &profile);
    Ok(())
}

fn cmd_filter(cfg: &ExplorerConfig, cli: &Cli, query: &str, region: &str) -> Result<()> {
    let region = FilterState::parse_region(region)?;
    let mut explorer = build_explorer(cfg, cli)?;
    explorer.on_search_change(query);
    explorer.on_region_change(region);
    let codes = explorer.matching_codes();
    println!("{} countries found", codes.len());
    for code in codes {
        let name = explorer.directory().name_of(&code);
        let region = explorer
            .directory()
            .region_of(&code)
            .map(|r| r.label())
            .unwrap_or("-");
        println!("{}  {:<32} {}", code, name, region);
    }
    Ok(())
}

fn cmd_select(cfg: &ExplorerConfig, cli: &Cli, args: &SelectArgs) -> Result<()> {
    let code = parse_code(&args.code)?;
    let mut explorer = build_explorer(cfg, cli)?;
    explorer.restore_from_persistence();
    if explorer.click_code(&code).is_none() {
        bail!("no shape for {} on the map", code);
    }
    finish(cfg, &mut explorer, args.wait.wait)?;

    let Some(series) = explorer.data().chart.clone() else {
        if args.chart.is_some() || args.out.is_some() {
            eprintln!("No indicator data for {}; nothing written.", code);
        }
        return Ok(());
    };
    if let Some(path) = &args.chart {
        let data = ChartData::from_series(&series, &cfg.indicator_label)
            .ok_or_else(|| anyhow::anyhow!("no data to plot"))?;
        chart::render_sparkline_svg(&data, path, 600, 200)?;
        eprintln!("Wrote chart to {}", path.display());
    }
    if let Some(path) = &args.out {
        save_series(&series, path, args.format.as_ref())?;
    }
    Ok(())
}

fn save_series(series: &IndicatorSeries, path: &Path, format: Option<&OutFormat>) -> Result<()> {
    let fmt = match format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    match fmt.as_str() {
        "csv" => storage::save_csv(series, path)?,
        "json" => storage::save_json(series, path)?,
        other => bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {} rows to {}", series.points.len(), path.display());
    Ok(())
}

fn cmd_restore(cfg: &ExplorerConfig, cli: &Cli) -> Result<()> {
    let mut explorer = build_explorer(cfg, cli)?;
    match explorer.restore_from_persistence() {
        Restored::Nothing => println!("No saved selection."),
        Restored::Expired => println!("Saved selection expired and was removed."),
        Restored::NoSuchElement(code) => println!("Saved selection {} is not on this map.", code),
        Restored::Selected { code, profile } => match profile {
            Some(p) => print_profile(&code, &p),
            None => println!("Selected {} (no cached profile; select it again to load).", code),
        },
    }
    Ok(())
}

fn cmd_retry(cfg: &ExplorerConfig, cli: &Cli, args: &WaitArgs) -> Result<()> {
    let mut explorer = build_explorer(cfg, cli)?;
    if explorer.retry().is_none() {
        println!("No saved selection to retry.");
        return Ok(());
    }
    finish(cfg, &mut explorer, args.wait)
}

fn cmd_clear(cfg: &ExplorerConfig, cli: &Cli) -> Result<()> {
    let mut explorer = build_explorer(cfg, cli)?;
    explorer.restore_from_persistence();
    explorer.clear(true);
    println!("Selection cleared.");
    Ok(())
}

fn cmd_export(cfg: &ExplorerConfig, args: &ExportArgs) -> Result<()> {
    let code = parse_code(&args.code)?;
    let indicator = args.indicator.as_deref().unwrap_or(&cfg.indicator_id);
    let years = args.years.unwrap_or(cfg.indicator_window_years);
    if years == 0 {
        bail!("--years must be at least 1");
    }
    let window = DateSpec::trailing(chrono::Utc::now().year(), years);
    let client = Client::from_config(cfg)?;
    let series = client.fetch_indicator(&code, indicator, window)?;
    let Some(series) = series.into_chronological() else {
        bail!("no {} data for {} in {}", indicator, code, window.to_query_param());
    };
    save_series(&series, &args.out, args.format.as_ref())
}
