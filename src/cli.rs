//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::{build_strategy_config, FileConfigAdapter};
use crate::domain::backtest::{latest_signal, run_backtest, BacktestResult};
use crate::domain::config_validation::validate_strategy_config;
use crate::domain::error::SigtraderError;
use crate::domain::scan::Scanner;
use crate::domain::strategy::{PositionSizing, StrategyConfig};
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "RSI/EMA signal engine and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest a single symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory for the trades/equity CSV reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest every symbol in the universe
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbol list, overrides [data] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Run symbols one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },
    /// Print the signal for the most recent bar
    Signal {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: Cli) -> Result<(), SigtraderError> {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            output,
        } => run_backtest_command(&config, symbol.as_deref(), data_dir, output.as_deref()),
        Command::Scan {
            config,
            symbols,
            data_dir,
            output,
            sequential,
        } => run_scan(
            &config,
            symbols.as_deref(),
            data_dir,
            output.as_deref(),
            sequential,
        ),
        Command::Signal {
            config,
            symbol,
            data_dir,
        } => run_signal(&config, &symbol, data_dir),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Load the INI file and build a validated strategy from it.
pub fn load_strategy(path: &Path) -> Result<(FileConfigAdapter, StrategyConfig), SigtraderError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    let strategy = build_strategy_config(&adapter)?;
    validate_strategy_config(&strategy)?;
    Ok((adapter, strategy))
}

pub fn resolve_data_dir(
    override_dir: Option<PathBuf>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, SigtraderError> {
    override_dir
        .or_else(|| config.get_string("data", "directory").map(PathBuf::from))
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "data".into(),
            key: "directory".into(),
        })
}

/// Command-line list first, then `[data] symbols`, then every symbol the
/// data source knows about.
pub fn resolve_symbols(
    override_list: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, SigtraderError> {
    if let Some(list) = override_list {
        return Ok(parse_symbols(list)?);
    }
    if let Some(list) = config.get_string("data", "symbols") {
        return Ok(parse_symbols(&list)?);
    }
    data_port.list_symbols()
}

fn run_backtest_command(
    config_path: &Path,
    symbol_override: Option<&str>,
    data_dir: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<(), SigtraderError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir, &adapter)?);

    let symbol = match symbol_override {
        Some(s) => s.trim().to_uppercase(),
        None => {
            let symbols = resolve_symbols(None, &adapter, &data_port)?;
            match symbols.as_slice() {
                [only] => only.clone(),
                [] => {
                    return Err(SigtraderError::ConfigMissing {
                        section: "data".into(),
                        key: "symbols".into(),
                    });
                }
                _ => {
                    return Err(SigtraderError::ConfigInvalid {
                        section: "data".into(),
                        key: "symbols".into(),
                        reason: "several symbols configured, pass --symbol or use scan".into(),
                    });
                }
            }
        }
    };

    print_strategy(&strategy);
    let bars = data_port.fetch_bars(&symbol)?;
    eprintln!("Running backtest: {} ({} bars)", symbol, bars.len());
    let result = run_backtest(&symbol, &bars, &strategy)?;

    print_result(&result);
    if let Some(dir) = output {
        CsvReportAdapter::new().write(&result, dir)?;
        eprintln!("\nReports written to: {}", dir.display());
    }
    Ok(())
}

fn run_scan(
    config_path: &Path,
    symbols_override: Option<&str>,
    data_dir: Option<PathBuf>,
    output: Option<&Path>,
    sequential: bool,
) -> Result<(), SigtraderError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir, &adapter)?);
    let symbols = resolve_symbols(symbols_override, &adapter, &data_port)?;

    print_strategy(&strategy);
    eprintln!("Loading {} symbols...", symbols.len());
    let universe = load_universe(&data_port, &symbols)?;
    for skipped in &universe.skipped {
        eprintln!("  {}: skipped ({})", skipped.symbol, skipped.reason);
    }

    let results = Scanner::new(&strategy)
        .with_parallelism(!sequential)
        .scan(&universe.series);

    eprintln!("\n=== Scan Results ===");
    let mut completed = Vec::new();
    for (symbol, outcome) in &results {
        match outcome {
            Ok(result) => {
                let m = &result.metrics;
                let pnl_sign = if m.total_pnl >= 0.0 { "+" } else { "" };
                eprintln!(
                    "  {}:  {} trades, {:.1}% win rate, {}{:.2} P&L, max DD {:.2}",
                    symbol,
                    m.trade_count,
                    m.win_rate * 100.0,
                    pnl_sign,
                    m.total_pnl,
                    m.max_drawdown,
                );
                completed.push(result);
            }
            Err(e) => eprintln!("  {}:  error: {}", symbol, e),
        }
    }

    if let Some(dir) = output {
        CsvReportAdapter::new().write_all(completed.iter().copied(), dir)?;
        eprintln!("\nReports written to: {}", dir.display());
    }

    if completed.is_empty() {
        // nothing usable: surface the first failure
        if let Some(Err(e)) = results.into_values().next() {
            return Err(e);
        }
    }
    Ok(())
}

fn run_signal(
    config_path: &Path,
    symbol: &str,
    data_dir: Option<PathBuf>,
) -> Result<(), SigtraderError> {
    let (adapter, strategy) = load_strategy(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_dir(data_dir, &adapter)?);
    let symbol = symbol.trim().to_uppercase();

    let bars = data_port.fetch_bars(&symbol)?;
    let signal = latest_signal(&symbol, &bars, &strategy)?;
    println!(
        "{} {} {} {:.4}",
        signal.symbol,
        signal.timestamp.format("%Y-%m-%d %H:%M:%S"),
        signal.kind,
        signal.reference_price
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    let (_, strategy) = load_strategy(config_path)?;
    print_strategy(&strategy);
    eprintln!("  Warm-up bars:   {}", strategy.warmup_bars());
    eprintln!("  Minimum bars:   {}", strategy.min_bars());
    eprintln!("\nStrategy configuration is valid.");
    Ok(())
}

fn print_strategy(strategy: &StrategyConfig) {
    eprintln!("\n=== Strategy ===");
    eprintln!(
        "  RSI({}) bands:  {} / {}",
        strategy.rsi_period, strategy.rsi_oversold, strategy.rsi_overbought
    );
    eprintln!(
        "  EMA fast/slow:  {} / {}",
        strategy.ema_fast_period, strategy.ema_slow_period
    );
    let filters: Vec<String> = strategy
        .required_indicators()
        .iter()
        .skip(3)
        .map(ToString::to_string)
        .collect();
    if filters.is_empty() {
        eprintln!("  Filters:        none");
    } else {
        eprintln!("  Filters:        {}", filters.join(", "));
    }
    match strategy.position_sizing {
        PositionSizing::FixedQuantity(q) => eprintln!("  Sizing:         {q} units"),
        PositionSizing::FixedNotional(n) => eprintln!("  Sizing:         {n:.2} notional"),
    }
    if let Some(pct) = strategy.stop_loss_pct {
        eprintln!("  Stop loss:      {:.2}%", pct * 100.0);
    }
    if let Some(pct) = strategy.take_profit_pct {
        eprintln!("  Take profit:    {:.2}%", pct * 100.0);
    }
}

fn print_result(result: &BacktestResult) {
    let m = &result.metrics;
    eprintln!("\n=== Results: {} ===", result.symbol);
    eprintln!("Total P&L:        {:.2}", m.total_pnl);
    eprintln!("Average P&L:      {:.2}", m.average_pnl);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("Max Drawdown:     -{:.2}", m.max_drawdown);
    eprintln!("Total Trades:     {}", m.trade_count);
    eprintln!("Win Rate:         {:.1}%", m.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Avg Holding Bars: {:.1}", m.avg_holding_bars);

    if !result.trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for t in &result.trades {
            eprintln!(
                "  {} -> {}  {:.2} -> {:.2}  {:+.2} ({:+.2}%)  {}",
                t.entry_timestamp.format("%Y-%m-%d"),
                t.exit_timestamp.format("%Y-%m-%d"),
                t.entry_price,
                t.exit_price,
                t.pnl,
                t.pnl_percent,
                t.exit_reason,
            );
        }
    }
}
