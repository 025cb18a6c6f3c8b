//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::error::MarketlabError;
use crate::domain::optimizer::{self, GridSpec, OptimizerOptions};
use crate::domain::series::PriceSeries;
use crate::domain::risk::{position_size, risk_reward, PositionSize, RiskReward};
use crate::domain::sltp::simulate_exit;
use crate::domain::strategy::Strategy;
use crate::domain::whatif::{
    all_in_scenario, compare_scenarios, dollar_cost_average_scenario, lump_sum_vs_dca,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "marketlab", about = "Trading strategy simulator and what-if engine")]
pub struct Cli {
    /// Directory of <SYMBOL>.csv price files
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,
    /// INI config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Emit results as JSON instead of a console summary
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest a strategy over a date range
    Backtest {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Strategy: "buy-and-hold" or "sma"
        #[arg(long, default_value = "buy-and-hold")]
        strategy: String,
        #[arg(long, default_value_t = 50)]
        short_window: usize,
        #[arg(long, default_value_t = 200)]
        long_window: usize,
        #[arg(long)]
        cash: Option<f64>,
    },
    /// Simulate one position with stop-loss/take-profit exits
    Simulate {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        entry_price: f64,
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
        #[arg(long)]
        stop_loss: f64,
        #[arg(long)]
        take_profit: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Grid-search stop-loss/take-profit combinations
    Optimize {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Stop-loss candidates, e.g. --stop-loss 2,5,10,15
        #[arg(long, value_delimiter = ',')]
        stop_loss: Vec<f64>,
        /// Take-profit candidates, e.g. --take-profit 5,10,15,20,30
        #[arg(long, value_delimiter = ',')]
        take_profit: Vec<f64>,
        #[arg(long)]
        budget_secs: Option<u64>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// All-in scenario for a single symbol
    WhatIf {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Dollar-cost averaging: fixed monthly purchases over a date range
    Dca {
        #[arg(long)]
        symbol: String,
        /// Amount invested at the first close of each month
        #[arg(long)]
        monthly: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Compare one all-in purchase against spreading the amount monthly
    LumpVsDca {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        amount: f64,
        /// Number of monthly purchases the amount is split across
        #[arg(long, default_value_t = 12)]
        periods: usize,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Risk/reward ratio and optional position sizing for a planned trade
    Risk {
        #[arg(long)]
        entry_price: f64,
        #[arg(long)]
        stop_loss_price: f64,
        #[arg(long)]
        take_profit_price: f64,
        /// When given, also size the position against this account value
        #[arg(long)]
        account_value: Option<f64>,
        /// Percentage of the account risked per trade
        #[arg(long, default_value_t = 2.0)]
        risk_pct: f64,
    },
    /// Compare all-in scenarios across symbols
    Compare {
        /// Comma-separated symbols, e.g. --symbols RXRX,IONQ,ACHR
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Show available symbols and their data coverage
    Info,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match cli.config.as_ref().map(load_config).transpose() {
        Ok(c) => c,
        Err(code) => return code,
    };
    let adapter = CsvAdapter::new(data_dir(cli.data.as_ref(), config.as_ref()));

    let outcome = match cli.command {
        Command::Backtest {
            ref symbol,
            start,
            end,
            ref strategy,
            short_window,
            long_window,
            cash,
        } => {
            let initial_cash = cash.unwrap_or_else(|| default_cash(config.as_ref()));
            run_backtest_command(
                &adapter,
                symbol,
                start,
                end,
                strategy,
                short_window,
                long_window,
                initial_cash,
                cli.json,
            )
        }
        Command::Simulate {
            ref symbol,
            entry_price,
            quantity,
            stop_loss,
            take_profit,
            start,
            end,
        } => run_simulate_command(
            &adapter,
            symbol,
            entry_price,
            quantity,
            stop_loss,
            take_profit,
            start,
            end,
            cli.json,
        ),
        Command::Optimize {
            ref symbol,
            start,
            end,
            ref stop_loss,
            ref take_profit,
            budget_secs,
            top,
        } => run_optimize_command(
            &adapter,
            config.as_ref(),
            symbol,
            start,
            end,
            stop_loss,
            take_profit,
            budget_secs,
            top,
            cli.json,
        ),
        Command::WhatIf {
            ref symbol,
            amount,
            start,
            end,
        } => run_whatif_command(&adapter, symbol, amount, start, end, cli.json),
        Command::Dca {
            ref symbol,
            monthly,
            start,
            end,
        } => run_dca_command(&adapter, symbol, monthly, start, end, cli.json),
        Command::LumpVsDca {
            ref symbol,
            amount,
            periods,
            start,
            end,
        } => run_lump_vs_dca_command(&adapter, symbol, amount, periods, start, end, cli.json),
        Command::Risk {
            entry_price,
            stop_loss_price,
            take_profit_price,
            account_value,
            risk_pct,
        } => run_risk_command(
            entry_price,
            stop_loss_price,
            take_profit_price,
            account_value,
            risk_pct,
            cli.json,
        ),
        Command::Compare {
            ref symbols,
            amount,
            start,
            end,
        } => run_compare_command(&adapter, symbols, amount, start, end, cli.json),
        Command::Info => run_info_command(&adapter),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MarketlabError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        (&err).into()
    })
}

/// `--data` beats the config's `[data] csv_path`; the fallback is the
/// current directory.
fn data_dir(data: Option<&PathBuf>, config: Option<&FileConfigAdapter>) -> PathBuf {
    if let Some(dir) = data {
        return dir.clone();
    }
    if let Some(config) = config {
        if let Some(dir) = config.get_string("data", "csv_path") {
            return PathBuf::from(dir);
        }
    }
    PathBuf::from(".")
}

fn optimizer_options(
    config: Option<&FileConfigAdapter>,
    budget_secs: Option<u64>,
) -> OptimizerOptions {
    let mut options = OptimizerOptions::default();
    if let Some(config) = config {
        // A negative value must not wrap into a huge bound.
        options.max_combinations = config
            .get_int(
                "optimizer",
                "max_combinations",
                options.max_combinations as i64,
            )
            .max(0) as usize;
        let budget = config.get_int("optimizer", "budget_secs", 0);
        if budget > 0 {
            options.budget = Some(Duration::from_secs(budget as u64));
        }
    }
    if let Some(secs) = budget_secs {
        options.budget = Some(Duration::from_secs(secs));
    }
    options
}

fn default_cash(config: Option<&FileConfigAdapter>) -> f64 {
    config
        .map(|c| c.get_double("engine", "initial_cash", 100_000.0))
        .unwrap_or(100_000.0)
}

fn fetch_series(
    adapter: &CsvAdapter,
    symbol: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, MarketlabError> {
    if symbol.is_empty() {
        return Err(MarketlabError::invalid_input("symbol must be non-empty"));
    }
    let end = end.unwrap_or(NaiveDate::MAX);
    if end < start {
        return Err(MarketlabError::invalid_input(format!(
            "end date {end} is before start date {start}"
        )));
    }
    let series = adapter.fetch_historical(symbol, start, end)?;
    if series.is_empty() {
        return Err(MarketlabError::NoData {
            symbol: symbol.to_string(),
        });
    }
    Ok(series)
}

fn parse_strategy(
    name: &str,
    short_window: usize,
    long_window: usize,
) -> Result<Strategy, MarketlabError> {
    match name {
        "buy-and-hold" | "bah" => Ok(Strategy::BuyAndHold),
        "sma" | "sma-crossover" => Strategy::sma_crossover(short_window, long_window),
        other => Err(MarketlabError::invalid_input(format!(
            "unknown strategy '{other}' (expected buy-and-hold or sma)"
        ))),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), MarketlabError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| MarketlabError::invalid_input(format!("JSON encoding failed: {e}")))?;
    println!("{rendered}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_backtest_command(
    adapter: &CsvAdapter,
    symbol: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    strategy_name: &str,
    short_window: usize,
    long_window: usize,
    initial_cash: f64,
    json: bool,
) -> Result<(), MarketlabError> {
    let strategy = parse_strategy(strategy_name, short_window, long_window)?;
    let series = fetch_series(adapter, symbol, start, end)?;
    let result = run_backtest(symbol, &series, &strategy, initial_cash)?;

    if json {
        return print_json(&result);
    }

    println!("=== Backtest: {} on {} ===", result.strategy_name, symbol);
    println!("Period:         {} to {}", start, series.last().map(|p| p.date).unwrap_or(start));
    println!("Initial Value:  {:.2}", result.initial_value);
    println!("Final Value:    {:.2}", result.final_value);
    println!("Total Return:   {:.2}%", result.total_return_pct);
    println!("Volatility:     {:.2}%", result.annual_volatility_pct);
    println!("Sharpe Ratio:   {:.2}", result.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", result.max_drawdown_pct);
    println!("Trades:         {}", result.num_trades);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_simulate_command(
    adapter: &CsvAdapter,
    symbol: &str,
    entry_price: f64,
    quantity: f64,
    stop_loss: f64,
    take_profit: f64,
    start: NaiveDate,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<(), MarketlabError> {
    let series = fetch_series(adapter, symbol, start, end)?;
    let result = simulate_exit(symbol, &series, entry_price, quantity, stop_loss, take_profit)?;

    if json {
        return print_json(&result);
    }

    println!("=== Stop-Loss/Take-Profit Simulation: {symbol} ===");
    println!("Entry:          {:.2} on {}", result.entry_price, result.entry_date);
    println!("Stop Loss:      {:.2}", result.stop_loss_price);
    println!("Take Profit:    {:.2}", result.take_profit_price);
    println!(
        "Exit:           {:.2} on {} ({})",
        result.exit_price, result.exit_date, result.exit_reason
    );
    println!("Holding Days:   {}", result.holding_days);
    println!(
        "P&L:            {:.2} ({:.2}%)",
        result.profit_loss, result.profit_loss_pct
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_optimize_command(
    adapter: &CsvAdapter,
    config: Option<&FileConfigAdapter>,
    symbol: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    stop_loss: &[f64],
    take_profit: &[f64],
    budget_secs: Option<u64>,
    top: usize,
    json: bool,
) -> Result<(), MarketlabError> {
    let series = fetch_series(adapter, symbol, start, end)?;

    let grid = if stop_loss.is_empty() && take_profit.is_empty() {
        GridSpec::default()
    } else if stop_loss.is_empty() || take_profit.is_empty() {
        return Err(MarketlabError::invalid_input(
            "provide both --stop-loss and --take-profit candidates, or neither",
        ));
    } else {
        GridSpec::new(stop_loss.to_vec(), take_profit.to_vec())?
    };

    let options = optimizer_options(config, budget_secs);
    let result = optimizer::optimize(symbol, &series, &grid, &options)?;

    if json {
        return print_json(&result);
    }

    println!("=== Optimization: {symbol} ===");
    println!(
        "Best:           SL {:.1}% / TP {:.1}%",
        result.best_sl_pct, result.best_tp_pct
    );
    println!("Net Profit:     {:.2}%", result.best_net_profit_pct);
    println!("Win Rate:       {:.1}%", result.best_win_rate * 100.0);
    println!();
    println!("  SL%    TP%    Net%    Win%   Trades");
    for combo in result.top_by_profit(top) {
        println!(
            "  {:<5.1}  {:<5.1}  {:<7.2} {:<6.1} {}",
            combo.stop_loss_pct,
            combo.take_profit_pct,
            combo.net_profit_pct,
            combo.win_rate * 100.0,
            combo.total_trades
        );
    }
    Ok(())
}

fn run_whatif_command(
    adapter: &CsvAdapter,
    symbol: &str,
    amount: f64,
    start: NaiveDate,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<(), MarketlabError> {
    let series = fetch_series(adapter, symbol, start, end)?;
    let result = all_in_scenario(symbol, &series, amount)?;

    if json {
        return print_json(&result);
    }

    println!("=== All-In on {symbol} ===");
    println!("Entry:          {:.2} on {}", result.entry_price, result.entry_date);
    println!("Exit:           {:.2} on {}", result.exit_price, result.exit_date);
    println!("Shares:         {:.4}", result.shares);
    println!("Exit Value:     {:.2}", result.exit_value);
    println!(
        "P&L:            {:.2} ({:.2}%)",
        result.profit_loss, result.profit_loss_pct
    );
    println!("Annualized:     {:.2}%", result.annualized_return * 100.0);
    println!("Volatility:     {:.2}%", result.annual_volatility_pct);
    if let (Some(peak_date), Some(dd_date)) = (result.peak_date, result.max_drawdown_date) {
        println!("Peak:           {:.2} on {}", result.peak_value, peak_date);
        println!(
            "Max Drawdown:   {:.2}% (trough {})",
            result.max_drawdown_pct, dd_date
        );
    }
    Ok(())
}

fn run_dca_command(
    adapter: &CsvAdapter,
    symbol: &str,
    monthly: f64,
    start: NaiveDate,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<(), MarketlabError> {
    let series = fetch_series(adapter, symbol, start, end)?;
    let result = dollar_cost_average_scenario(symbol, &series, monthly)?;

    if json {
        return print_json(&result);
    }

    println!("=== Dollar-Cost Averaging: {symbol} ===");
    println!("Monthly:        {:.2}", result.monthly_investment);
    println!("Purchases:      {}", result.num_purchases);
    println!("Invested:       {:.2}", result.total_invested);
    println!("Shares:         {:.4}", result.total_shares);
    println!("Avg Price:      {:.2}", result.avg_price);
    println!("Final Price:    {:.2}", result.final_price);
    println!("Final Value:    {:.2}", result.final_value);
    println!(
        "P&L:            {:.2} ({:.2}%)",
        result.profit_loss, result.profit_loss_pct
    );
    Ok(())
}

fn run_lump_vs_dca_command(
    adapter: &CsvAdapter,
    symbol: &str,
    amount: f64,
    periods: usize,
    start: NaiveDate,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<(), MarketlabError> {
    let series = fetch_series(adapter, symbol, start, end)?;
    let result = lump_sum_vs_dca(symbol, &series, amount, periods)?;

    if json {
        return print_json(&result);
    }

    println!("=== Lump Sum vs DCA: {symbol} ===");
    println!(
        "Lump Sum:       {:.2} ({:.2}%, drawdown {:.2}%)",
        result.lump_sum.final_value, result.lump_sum.return_pct, result.lump_sum.max_drawdown_pct
    );
    println!(
        "DCA:            {:.2} ({:.2}%, {} purchases)",
        result.dca.final_value, result.dca.return_pct, result.dca.num_purchases
    );
    println!("Winner:         {}", result.winner);
    println!(
        "Difference:     {:.2} ({:.2}% of amount)",
        result.difference, result.difference_pct
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct RiskReport {
    risk_reward: RiskReward,
    position_size: Option<PositionSize>,
}

fn run_risk_command(
    entry_price: f64,
    stop_loss_price: f64,
    take_profit_price: f64,
    account_value: Option<f64>,
    risk_pct: f64,
    json: bool,
) -> Result<(), MarketlabError> {
    let rr = risk_reward(entry_price, stop_loss_price, take_profit_price)?;
    let sizing = account_value
        .map(|value| position_size(value, risk_pct, entry_price, stop_loss_price))
        .transpose()?;

    if json {
        return print_json(&RiskReport {
            risk_reward: rr,
            position_size: sizing,
        });
    }

    println!("=== Risk/Reward ===");
    println!("Risk:           {:.2} ({:.2}%)", rr.risk, rr.risk_pct);
    println!("Reward:         {:.2} ({:.2}%)", rr.reward, rr.reward_pct);
    println!("Ratio:          {:.2}", rr.risk_reward_ratio);
    if let Some(sizing) = sizing {
        println!(
            "Position:       {:.2} shares, cost {:.2}, risking {:.2} ({:.1}% of account)",
            sizing.quantity, sizing.total_cost, sizing.risk_amount, sizing.account_risk_pct
        );
    }
    Ok(())
}

fn run_compare_command(
    adapter: &CsvAdapter,
    symbols: &[String],
    amount: f64,
    start: NaiveDate,
    end: Option<NaiveDate>,
    json: bool,
) -> Result<(), MarketlabError> {
    if symbols.is_empty() {
        return Err(MarketlabError::invalid_input(
            "at least one symbol is required",
        ));
    }

    let mut candidates = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match fetch_series(adapter, symbol, start, end) {
            Ok(series) => candidates.push((symbol.clone(), series)),
            Err(e) => eprintln!("warning: skipping {symbol} ({e})"),
        }
    }

    let comparison = compare_scenarios(&candidates, amount)?;

    if json {
        return print_json(&comparison);
    }

    println!("=== Scenario Comparison ({:.2} each) ===", amount);
    for scenario in &comparison.scenarios {
        println!(
            "  {:<6} {:>9.2}%  final {:.2}  drawdown {:.2}%",
            scenario.symbol, scenario.profit_loss_pct, scenario.exit_value, scenario.max_drawdown_pct
        );
    }
    println!(
        "Best:           {} ({:.2}%)",
        comparison.best_performer.symbol, comparison.best_performer.return_pct
    );
    println!(
        "Worst:          {} ({:.2}%)",
        comparison.worst_performer.symbol, comparison.worst_performer.return_pct
    );
    println!("Spread:         {:.2} points", comparison.spread);
    Ok(())
}

fn run_info_command(adapter: &CsvAdapter) -> Result<(), MarketlabError> {
    let symbols = adapter.list_symbols()?;
    if symbols.is_empty() {
        println!("no symbols found");
        return Ok(());
    }
    for symbol in symbols {
        match adapter.fetch_historical(&symbol, NaiveDate::MIN, NaiveDate::MAX) {
            Ok(series) => match (series.first(), series.last()) {
                (Some(first), Some(last)) => println!(
                    "{symbol}: {} points, {} to {}",
                    series.len(),
                    first.date,
                    last.date
                ),
                _ => println!("{symbol}: no data"),
            },
            Err(e) => eprintln!("error reading {symbol}: {e}"),
        }
    }
    Ok(())
}
