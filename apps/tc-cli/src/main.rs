use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tc_core::{TcError, TcResult, ensure_finite};
use tc_thermo::{
    CompoundRecordSet, DatabaseRecord, EngineConfig, TemperatureGrid, ThermoEngine,
    ThermodynamicProperties,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tc-cli")]
#[command(about = "Thermochem CLI - multi-phase thermodynamic property tables", long_about = None)]
struct Cli {
    /// Engine configuration YAML file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Records file (YAML, or JSON by extension)
    records_path: PathBuf,
    /// Restrict to one formula
    #[arg(short, long)]
    formula: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Property table over a temperature grid
    Table {
        #[command(flatten)]
        source: Source,
        /// Lower temperature in K
        #[arg(long, default_value_t = 298.15)]
        t_min: f64,
        /// Upper temperature in K
        #[arg(long)]
        t_max: f64,
        /// Grid step in K (25..=250)
        #[arg(long, default_value_t = 100.0)]
        step: f64,
        /// Print JSON lines instead of columns
        #[arg(long)]
        json: bool,
    },
    /// Properties at individual temperatures
    At {
        #[command(flatten)]
        source: Source,
        /// Temperatures in K
        #[arg(required = true)]
        temperatures: Vec<f64>,
        /// Print JSON lines instead of columns
        #[arg(long)]
        json: bool,
    },
    /// Derived phase transitions and consistency warnings
    Transitions {
        #[command(flatten)]
        source: Source,
    },
}

fn main() -> TcResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_str(&read_file(path)?)?,
        None => EngineConfig::default(),
    };
    let engine = ThermoEngine::new(config)?;

    match cli.command {
        Commands::Table {
            source,
            t_min,
            t_max,
            step,
            json,
        } => cmd_table(&engine, &source, t_min, t_max, step, json),
        Commands::At {
            source,
            temperatures,
            json,
        } => cmd_at(&engine, &source, &temperatures, json),
        Commands::Transitions { source } => cmd_transitions(&engine, &source),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> TcResult<()> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_env("TC_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| TcError::Invariant {
            what: format!("failed to initialize tracing subscriber: {error}"),
        })
}

fn cmd_table(
    engine: &ThermoEngine,
    source: &Source,
    t_min: f64,
    t_max: f64,
    step: f64,
    json: bool,
) -> TcResult<()> {
    let grid = TemperatureGrid::new(t_min, t_max, step)?;
    for set in load_sets(engine, source)? {
        let table = engine.table(&set, &grid)?;
        if !json {
            println!("{}", table.formula());
            print_header();
        }
        for row in &table {
            print_row(row, json)?;
        }
    }
    Ok(())
}

fn cmd_at(engine: &ThermoEngine, source: &Source, temperatures: &[f64], json: bool) -> TcResult<()> {
    for &t in temperatures {
        ensure_finite(t, "temperature")?;
    }
    for set in load_sets(engine, source)? {
        if !json {
            println!("{}", set.formula());
            print_header();
        }
        for result in engine.evaluate_batch(&set, temperatures) {
            print_row(&result?, json)?;
        }
    }
    Ok(())
}

fn cmd_transitions(engine: &ThermoEngine, source: &Source) -> TcResult<()> {
    for set in load_sets(engine, source)? {
        let transitions = engine.extract_transitions(&set);
        println!("{}", set.formula());
        if transitions.is_empty() {
            println!("  no phase transitions");
        }
        for tr in &transitions {
            println!(
                "  {:<12} {} -> {}  T = {:>8.2} K  ΔH = {:>9.3} kJ/mol  ΔS = {:>8.3} J/(mol·K)  [{}, reliability {:.1}]",
                tr.kind(),
                tr.from_phase(),
                tr.to_phase(),
                tr.temperature_k(),
                tr.delta_h_kj_mol(),
                tr.delta_s_j_mol_k(),
                tr.method(),
                tr.reliability()
            );
        }
        for w in set.warnings() {
            println!("  ! {w}");
        }
        for w in engine.validate_consistency(&transitions) {
            println!("  ! {w}");
        }
    }
    Ok(())
}

fn print_header() {
    println!(
        "  {:>9} {:>5} {:>10} {:>12} {:>10} {:>12}",
        "T [K]", "phase", "Cp", "H [kJ/mol]", "S", "G [kJ/mol]"
    );
}

fn print_row(p: &ThermodynamicProperties, json: bool) -> TcResult<()> {
    if json {
        let line = serde_json::to_string(p).map_err(|e| TcError::InvalidArg {
            what: format!("serialize row: {e}"),
        })?;
        println!("{line}");
        return Ok(());
    }
    let phase = p.phase.map(|ph| ph.code()).unwrap_or("-");
    println!(
        "  {:>9.2} {:>5} {:>10.3} {:>12.3} {:>10.3} {:>12.3}",
        p.temperature_k,
        phase,
        p.cp_j_mol_k,
        p.h_kj_mol(),
        p.s_j_mol_k,
        p.g_kj_mol()
    );
    Ok(())
}

fn read_file(path: &Path) -> TcResult<String> {
    std::fs::read_to_string(path).map_err(|e| TcError::InvalidArg {
        what: format!("{}: {e}", path.display()),
    })
}

fn parse_records(text: &str, json: bool) -> TcResult<Vec<DatabaseRecord>> {
    let parsed = if json {
        serde_json::from_str(text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    };
    parsed.map_err(|what| TcError::InvalidArg {
        what: format!("records: {what}"),
    })
}

/// One record set per formula, in formula order.
fn load_sets(engine: &ThermoEngine, source: &Source) -> TcResult<Vec<CompoundRecordSet>> {
    let path = &source.records_path;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let records = parse_records(&read_file(path)?, is_json)?;
    info!(path = %path.display(), records = records.len(), "records loaded");

    let mut by_formula: BTreeMap<String, Vec<DatabaseRecord>> = BTreeMap::new();
    for record in records {
        by_formula
            .entry(record.formula().to_string())
            .or_default()
            .push(record);
    }
    if let Some(wanted) = &source.formula {
        by_formula.retain(|formula, _| formula == wanted);
        if by_formula.is_empty() {
            return Err(TcError::InvalidArg {
                what: format!("no records for formula '{wanted}'"),
            });
        }
    }

    by_formula
        .into_values()
        .map(|records| engine.build_record_set(records).map_err(TcError::from))
        .collect()
}
