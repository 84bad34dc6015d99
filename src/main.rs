use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use momo::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "momo")]
#[command(about = "A Rust-based momentum signal and backtesting engine for equities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest
    Run {
        //path to csv data file (date,open,high,low,close,volume)
        #[arg(long)]
        data: PathBuf,

        //symbol to trade (eg tsla, nvda)
        #[arg(long)]
        symbol: String,

        //initial account cash
        #[arg(long, default_value = "100000")]
        initial_cash: f64,

        //commission rate on notional per side
        #[arg(long, default_value = "0.001")]
        commission_rate: f64,

        //annualized risk-free rate for the sharpe calculation
        #[arg(long, default_value = "0.02")]
        risk_free_rate: f64,

        //short moving-average window
        #[arg(long, default_value = "3")]
        short: usize,

        //long moving-average window
        #[arg(long, default_value = "6")]
        long: usize,

        //minimum absolute relative momentum to act on
        #[arg(long, default_value = "0.01")]
        threshold: f64,

        //target number of trades per week
        #[arg(long, default_value = "2")]
        max_trades_per_week: usize,

        //risk overlay parameters (any of these enables the enhanced engine)
        //fixed stop-loss percentage (eg 0.1 = exit at -10%)
        #[arg(long)]
        stop_loss: Option<f64>,

        //trailing stop percentage off the high since entry
        #[arg(long)]
        trailing_stop: Option<f64>,

        //max portfolio drawdown before new entries are suppressed
        #[arg(long)]
        max_drawdown: Option<f64>,

        //max single-buy fraction of available cash
        #[arg(long, default_value = "0.5")]
        max_position_pct: f64,

        //output options
        //output path for equity curve csv
        #[arg(long)]
        output_equity_csv: Option<PathBuf>,

        //output path for trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,

        //send the final day's plan through the mock broker
        #[arg(long)]
        dry_run_order: bool,
    },

    //grid-search strategy and risk parameters
    Optimize {
        //path to csv data file
        #[arg(long)]
        data: PathBuf,

        //symbol to trade
        #[arg(long)]
        symbol: String,

        //initial account cash
        #[arg(long, default_value = "100000")]
        initial_cash: f64,

        //comma-separated short windows
        #[arg(long, default_value = "3,5,8", value_delimiter = ',')]
        short_windows: Vec<usize>,

        //comma-separated long windows
        #[arg(long, default_value = "6,10,15", value_delimiter = ',')]
        long_windows: Vec<usize>,

        //comma-separated thresholds
        #[arg(long, default_value = "0.005,0.01,0.02", value_delimiter = ',')]
        thresholds: Vec<f64>,

        //comma-separated trades-per-week caps
        #[arg(long, default_value = "1,2", value_delimiter = ',')]
        max_trades_per_week: Vec<usize>,

        //comma-separated stop-loss percentages
        #[arg(long, default_value = "0.08,0.12", value_delimiter = ',')]
        stop_losses: Vec<f64>,

        //comma-separated trailing-stop percentages
        #[arg(long, default_value = "0.10,0.15", value_delimiter = ',')]
        trailing_stops: Vec<f64>,

        //comma-separated max position fractions
        #[arg(long, default_value = "0.5", value_delimiter = ',')]
        max_position_pcts: Vec<f64>,

        //number of best results to display
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            symbol,
            initial_cash,
            commission_rate,
            risk_free_rate,
            short,
            long,
            threshold,
            max_trades_per_week,
            stop_loss,
            trailing_stop,
            max_drawdown,
            max_position_pct,
            output_equity_csv,
            output_trades_csv,
            dry_run_order,
        } => run_backtest(RunArgs {
            data,
            symbol,
            initial_cash,
            commission_rate,
            risk_free_rate,
            short,
            long,
            threshold,
            max_trades_per_week,
            stop_loss,
            trailing_stop,
            max_drawdown,
            max_position_pct,
            output_equity_csv,
            output_trades_csv,
            dry_run_order,
        }),
        Commands::Optimize {
            data,
            symbol,
            initial_cash,
            short_windows,
            long_windows,
            thresholds,
            max_trades_per_week,
            stop_losses,
            trailing_stops,
            max_position_pcts,
            top,
        } => run_optimize(
            data,
            symbol,
            initial_cash,
            short_windows,
            long_windows,
            thresholds,
            max_trades_per_week,
            stop_losses,
            trailing_stops,
            max_position_pcts,
            top,
        ),
    }
}

struct RunArgs {
    data: PathBuf,
    symbol: String,
    initial_cash: f64,
    commission_rate: f64,
    risk_free_rate: f64,
    short: usize,
    long: usize,
    threshold: f64,
    max_trades_per_week: usize,
    stop_loss: Option<f64>,
    trailing_stop: Option<f64>,
    max_drawdown: Option<f64>,
    max_position_pct: f64,
    output_equity_csv: Option<PathBuf>,
    output_trades_csv: Option<PathBuf>,
    dry_run_order: bool,
}

fn run_backtest(args: RunArgs) -> Result<()> {
    println!("Momo Momentum Backtesting Engine");
    println!("=================================\n");

    //load data
    println!("Loading data from {:?}...", args.data);
    let bars =
        load_csv(&args.data).context(format!("Failed to load data from {:?}", args.data))?;

    if bars.is_empty() {
        anyhow::bail!("No bars found in {:?}", args.data);
    }

    println!("Loaded {} bars for {}", bars.len(), args.symbol);
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        println!("Date range: {} to {}\n", first.date, last.date);
    }

    //generate signals
    let model = MomentumSignalModel::new(args.short, args.long, args.threshold)?;
    println!(
        "Strategy: momentum (short={}, long={}, threshold={})",
        args.short, args.long, args.threshold
    );

    let decisions = model.generate(&bars);
    let filtered = model.filter_trading_slots(decisions, args.max_trades_per_week);

    let buy_signals = filtered
        .iter()
        .filter(|d| d.action == TradeAction::Buy)
        .count();
    let sell_signals = filtered
        .iter()
        .filter(|d| d.action == TradeAction::Sell)
        .count();
    println!("Signals: {} BUY, {} SELL\n", buy_signals, sell_signals);

    //size the signals
    let allocator =
        PositionAllocator::new(args.symbol.clone(), RiskBudget::new(args.initial_cash));

    let mut signals = Vec::new();
    let mut last_plan = None;
    for decision in &filtered {
        if decision.action == TradeAction::Hold {
            continue;
        }
        if let Some(plan) = allocator.propose(decision, None)? {
            signals.push((decision.bar.date, decision.action, plan.quantity));
            last_plan = Some(plan);
        }
    }
    println!("Prepared {} sized trade signals", signals.len());

    //run the backtest
    let config = BacktestConfig {
        initial_cash: args.initial_cash,
        commission_rate: args.commission_rate,
        risk_free_rate: args.risk_free_rate,
    };

    let use_risk_overlay =
        args.stop_loss.is_some() || args.trailing_stop.is_some() || args.max_drawdown.is_some();

    println!("Initial cash: ${:.2}", args.initial_cash);
    println!("Commission rate: {:.3}%\n", args.commission_rate * 100.0);
    println!("Running backtest...\n");

    let result = if use_risk_overlay {
        let risk_config = RiskConfig {
            stop_loss_pct: args.stop_loss,
            trailing_stop_pct: args.trailing_stop,
            max_portfolio_drawdown: args.max_drawdown,
            max_position_pct: args.max_position_pct,
        };
        let mut backtester = EnhancedBacktester::new(config, risk_config)?;
        let result = backtester.run(&args.symbol, &bars, &signals)?;

        let stats = backtester.risk_stats();
        println!("Risk controls:");
        println!("  stop-loss exits: {}", stats.stop_loss_exits);
        println!("  trailing-stop exits: {}", stats.trailing_stop_exits);
        println!("  drawdown halts: {}\n", stats.drawdown_stops);

        result
    } else {
        let mut backtester = Backtester::new(config);
        backtester.run(&args.symbol, &bars, &signals)?
    };

    //display results
    println!("Backtest Results");
    println!("================\n");
    result.metrics.pretty_print_table();

    //save outputs if requested
    if let Some(equity_path) = args.output_equity_csv {
        save_equity_csv(&result.equity_curve, &equity_path)?;
        println!("\nEquity curve saved to {:?}", equity_path);
    }

    if let Some(trades_path) = args.output_trades_csv {
        save_trades_csv(&result.trades, &trades_path)?;
        println!("Trades saved to {:?}", trades_path);
    }

    //optionally dry-run the most recent plan through the mock broker
    if args.dry_run_order {
        if let Some(plan) = last_plan {
            let broker = MockBroker::new();
            let report = broker.send_order(&plan);
            println!(
                "\nDry-run order {}: {:?} {} shares @ ${:.2}",
                report.order_id, report.status, report.filled_quantity, report.avg_price
            );
        } else {
            println!("\nNo actionable plan to dry-run");
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_optimize(
    data: PathBuf,
    symbol: String,
    initial_cash: f64,
    short_windows: Vec<usize>,
    long_windows: Vec<usize>,
    thresholds: Vec<f64>,
    max_trades_per_week: Vec<usize>,
    stop_losses: Vec<f64>,
    trailing_stops: Vec<f64>,
    max_position_pcts: Vec<f64>,
    top: usize,
) -> Result<()> {
    println!("Momo Parameter Grid Search");
    println!("==========================\n");

    let bars = load_csv(&data).context(format!("Failed to load data from {:?}", data))?;
    if bars.is_empty() {
        anyhow::bail!("No bars found in {:?}", data);
    }
    println!("Loaded {} bars for {}\n", bars.len(), symbol);

    let optimizer = ParameterOptimizer::new(symbol, bars, initial_cash);
    let results = optimizer.grid_search(
        &short_windows,
        &long_windows,
        &thresholds,
        &max_trades_per_week,
        &stop_losses,
        &trailing_stops,
        &max_position_pcts,
    );

    println!("Evaluated {} parameter sets\n", results.len());
    println!("Top {} by Sharpe ratio:", top.min(results.len()));

    for result in results.iter().take(top) {
        println!(
            "  {} -> return {:.2}%, sharpe {:.2}, max dd {:.2}%, trades {}",
            result.params,
            result.total_return * 100.0,
            result.sharpe_ratio,
            result.max_drawdown * 100.0,
            result.total_trades
        );
    }

    Ok(())
}

fn save_equity_csv(equity_curve: &[EquityPoint], path: &PathBuf) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "date,equity,drawdown,returns")?;

    for point in equity_curve {
        writeln!(
            file,
            "{},{},{},{}",
            point.date, point.equity, point.drawdown, point.returns
        )?;
    }

    Ok(())
}

fn save_trades_csv(trades: &[Trade], path: &PathBuf) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "date,action,symbol,quantity,price,commission,total")?;

    for trade in trades {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            trade.date,
            trade.action.as_str(),
            trade.symbol,
            trade.quantity,
            trade.price,
            trade.commission,
            trade.total_cost()
        )?;
    }

    Ok(())
}
