//! yoy-runner: headless driver for the year-over-year sales dashboard.
//!
//! Usage:
//!   yoy-runner --csv data/out/sales_yoy_comparison_final.csv --product 주택용 --month 2024-03
//!   yoy-runner --csv sales.csv --status retained --export filtered.csv
//!   yoy-runner --csv sales.csv --export            (writes the configured export file name)
//!   yoy-runner --csv sales.csv --import sales.db
//!   yoy-runner --db sales.db --ipc-mode

use anyhow::{Context, Result};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use yoy_core::{
    config::DashboardConfig,
    dataset::{DataSource, Dataset, DatasetCache},
    filter::FilterCriteria,
    presentation::{export_csv, MapLayer},
    record::{ChangeCategory, Status},
    store::SalesStore,
    types::SalesMonth,
    view::{render_state, ViewModel},
};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    SetFilters { criteria: FilterCriteria },
    /// Without a path the configured export file name is used.
    Export {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Reload,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");

    let source = match (arg_value(&args, "--csv"), arg_value(&args, "--db")) {
        (Some(csv), _) => DataSource::Csv(PathBuf::from(csv)),
        (None, Some(db)) => DataSource::Sqlite(PathBuf::from(db)),
        (None, None) => anyhow::bail!("one of --csv <path> or --db <path> is required"),
    };

    let config = match DashboardConfig::load(data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Using default dashboard config: {e}");
            DashboardConfig::default()
        }
    };

    let mut cache = DatasetCache::new(config.change_threshold);
    let dataset = cache
        .get_or_load(&source)
        .with_context(|| format!("loading {source}"))?;

    if let Some(db) = arg_value(&args, "--import") {
        import_into(db, &source, &dataset)?;
        return Ok(());
    }

    if ipc_mode {
        return run_ipc_loop(&mut cache, &source, &config);
    }

    let criteria = criteria_from_args(&args)?;
    let view = render_state(&dataset, &criteria, &config);

    println!("Year-over-year sales comparison");
    println!("  source:    {source}");
    println!("  records:   {}", dataset.len());
    println!();
    print_summary(&view);

    if args.iter().any(|a| a == "--export") {
        let path = arg_value(&args, "--export")
            .filter(|p| !p.starts_with("--"))
            .unwrap_or(config.export_file_name.as_str());
        write_export(&view, Path::new(path))?;
        println!();
        println!("  exported {} rows to {path}", view.rows.len());
    }

    Ok(())
}

fn run_ipc_loop(cache: &mut DatasetCache, source: &DataSource, config: &DashboardConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut criteria = FilterCriteria::default();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        // Every interaction is a full recomputation over the cached dataset.
        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                let view = render(cache, source, &criteria, config)?;
                writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            }
            IpcCommand::SetFilters { criteria: next } => {
                criteria = next;
                let view = render(cache, source, &criteria, config)?;
                writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            }
            IpcCommand::Export { path } => {
                let path = path.unwrap_or_else(|| PathBuf::from(&config.export_file_name));
                let view = render(cache, source, &criteria, config)?;
                write_export(&view, &path)?;
                let ack = serde_json::json!({ "exported": view.rows.len(), "path": path });
                writeln!(stdout, "{}", ack)?;
            }
            IpcCommand::Reload => {
                cache.invalidate(source);
                let view = render(cache, source, &criteria, config)?;
                writeln!(stdout, "{}", serde_json::to_string(&view)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn render(
    cache: &mut DatasetCache,
    source: &DataSource,
    criteria: &FilterCriteria,
    config: &DashboardConfig,
) -> Result<ViewModel> {
    let dataset = cache.get_or_load(source)?;
    Ok(render_state(&dataset, criteria, config))
}

fn import_into(db: &str, source: &DataSource, dataset: &Arc<Dataset>) -> Result<()> {
    let store = SalesStore::open(db)?;
    store.migrate()?;
    let import_id = store.insert_records(&source.to_string(), dataset.records())?;
    println!(
        "Imported {} records into {db} (import {import_id} of {})",
        dataset.len(),
        store.import_count()?
    );
    Ok(())
}

fn write_export(view: &ViewModel, path: &Path) -> Result<()> {
    let bytes = export_csv(&view.rows)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn print_summary(view: &ViewModel) {
    let c = &view.criteria;
    let s = &view.summary_display;

    println!("=== FILTERS ===");
    println!("  product:   {}", c.product.as_deref().unwrap_or("-"));
    println!(
        "  month:     {}",
        c.month.map(|m| m.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("  coloring:  {}", view.dimension.column_name());
    println!();
    println!("=== SUMMARY ===");
    println!("  retained:   {}", s.retained);
    println!("  new:        {}", s.new);
    println!("  churned:    {}", s.churned);
    println!("  monthly:    {} ({})", s.monthly.value, s.monthly.delta);
    println!("  cumulative: {} ({})", s.cumulative.value, s.cumulative.delta);
    if !s.monthly.percent.defined || !s.cumulative.percent.defined {
        println!("  note:       prior-year total is 0; change rate shown as 0% is undefined");
    }
    println!();

    for layer in [&view.monthly_map, &view.cumulative_map] {
        match layer {
            MapLayer::Markers { kind, markers, unplaced, .. } => {
                println!("  {kind:?} map: {} markers ({unplaced} without coordinates)", markers.len());
            }
            MapLayer::NoData { message, .. } => println!("  {message}"),
        }
    }
}

fn criteria_from_args(args: &[String]) -> Result<FilterCriteria> {
    let month = arg_value(args, "--month")
        .map(|m| m.parse::<SalesMonth>())
        .transpose()?;

    Ok(FilterCriteria {
        product: arg_value(args, "--product").map(str::to_string),
        month,
        provinces: list_arg(args, "--province"),
        districts: list_arg(args, "--district"),
        industry_categories: list_arg(args, "--industry-category"),
        industries: list_arg(args, "--industry"),
        statuses: parsed_list_arg::<Status>(args, "--status")?,
        change_categories: parsed_list_arg::<ChangeCategory>(args, "--change")?,
    })
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Comma separated values; the flag may also repeat.
fn list_arg(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .flat_map(|w| w[1].split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed_list_arg<T>(args: &[String], flag: &str) -> Result<Vec<T>>
where
    T: std::str::FromStr<Err = String>,
{
    list_arg(args, flag)
        .iter()
        .map(|v| v.parse::<T>().map_err(anyhow::Error::msg))
        .collect()
}
