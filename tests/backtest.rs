//end-to-end scenarios: csv -> signal model -> allocator -> engine -> metrics

use chrono::{Duration, NaiveDate};
use momo::prelude::*;

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            PriceBar::new_unchecked(
                start + Duration::days(i as i64),
                close,
                close,
                close,
                close,
                1_000.0,
            )
        })
        .collect()
}

//converts filtered decisions into sized (date, action, quantity) signals
fn size_signals(
    symbol: &str,
    capital: f64,
    decisions: &[SignalDecision],
) -> Vec<(NaiveDate, TradeAction, u32)> {
    let allocator = PositionAllocator::new(symbol, RiskBudget::new(capital));
    decisions
        .iter()
        .filter(|d| d.action != TradeAction::Hold)
        .filter_map(|d| {
            let plan = allocator.propose(d, None).unwrap()?;
            Some((d.bar.date, d.action, plan.quantity))
        })
        .collect()
}

#[test]
fn flat_prices_produce_no_trades_and_zero_return() {
    let bars = bars_from_closes(&[100.0; 30]);
    let model = MomentumSignalModel::new(3, 6, 0.01).unwrap();
    let decisions = model.generate(&bars);
    let filtered = model.filter_trading_slots(decisions, 2);
    let signals = size_signals("TSLA", 100_000.0, &filtered);

    let mut backtester = Backtester::new(BacktestConfig::default());
    let result = backtester.run("TSLA", &bars, &signals).unwrap();

    assert_eq!(result.metrics.total_trades, 0);
    assert!(result.trades.is_empty());
    assert_eq!(result.metrics.total_return, 0.0);
}

#[test]
fn rising_prices_generate_buys_and_profit() {
    //100 -> 150 over 100 bars
    let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64 * 0.5).collect();
    let bars = bars_from_closes(&closes);

    let model = MomentumSignalModel::new(3, 6, 0.0).unwrap();
    let decisions = model.generate(&bars);
    assert!(decisions[6..].iter().any(|d| d.action == TradeAction::Buy));

    //one explicit round trip is enough to bank the trend
    let signals = vec![
        (bars[6].date, TradeAction::Buy, 100),
        (bars[99].date, TradeAction::Sell, 100),
    ];
    let mut backtester = Backtester::new(BacktestConfig::default());
    let result = backtester.run("TSLA", &bars, &signals).unwrap();

    assert!(result.metrics.total_return > 0.0);
    assert_eq!(result.metrics.total_trades, 1);
    assert_eq!(result.metrics.profit_trades, 1);
}

#[test]
fn commission_math_matches_the_ledger() {
    let bars = bars_from_closes(&[100.0, 100.0]);
    let signals = vec![(bars[0].date, TradeAction::Buy, 100)];

    let mut backtester = Backtester::new(BacktestConfig {
        initial_cash: 100_000.0,
        commission_rate: 0.001,
        risk_free_rate: 0.02,
    });
    backtester.run("TSLA", &bars, &signals).unwrap();

    let account = backtester.account();
    //100_000 - (100*100 + 100*100*0.001) = 89_990
    assert!((account.cash - 89_990.0).abs() < 1e-9);
    let position = account.get_position("TSLA").unwrap();
    assert_eq!(position.quantity, 100);
    assert_eq!(position.avg_cost, 100.0);
}

#[test]
fn equity_curve_matches_bar_count_and_order() {
    let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i % 7) as f64).collect();
    let bars = bars_from_closes(&closes);

    let model = MomentumSignalModel::new(3, 6, 0.005).unwrap();
    let filtered = model.filter_trading_slots(model.generate(&bars), 2);
    let signals = size_signals("TSLA", 100_000.0, &filtered);

    let mut backtester = Backtester::new(BacktestConfig::default());
    let result = backtester.run("TSLA", &bars, &signals).unwrap();

    assert_eq!(result.equity_curve.len(), bars.len());
    for (point, bar) in result.equity_curve.iter().zip(bars.iter()) {
        assert_eq!(point.date, bar.date);
    }
}

#[test]
fn enhanced_engine_stops_out_before_new_signals() {
    //buy at 100, then an 11% drop forces a full exit
    let bars = bars_from_closes(&[100.0, 100.0, 89.0, 89.0, 89.0]);
    let signals = vec![(bars[0].date, TradeAction::Buy, 100)];

    let risk = RiskConfig {
        stop_loss_pct: Some(0.10),
        trailing_stop_pct: None,
        max_portfolio_drawdown: None,
        max_position_pct: 0.5,
    };
    let mut backtester = EnhancedBacktester::new(BacktestConfig::default(), risk).unwrap();
    let result = backtester.run("TSLA", &bars, &signals).unwrap();

    assert_eq!(backtester.risk_stats().stop_loss_exits, 1);
    assert!(backtester.account().get_position("TSLA").is_none());
    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[1].action, TradeAction::Sell);
    assert_eq!(result.trades[1].quantity, 100);
    //the forced exit books a loss
    assert!(result.metrics.total_return < 0.0);
}

#[test]
fn full_pipeline_respects_weekly_trade_budget() {
    let closes: Vec<f64> = (0..40)
        .map(|i| 100.0 + i as f64 + if i % 2 == 0 { 3.0 } else { -3.0 })
        .collect();
    let bars = bars_from_closes(&closes);

    let model = MomentumSignalModel::new(3, 6, 0.0).unwrap();
    let filtered = model.filter_trading_slots(model.generate(&bars), 2);

    let start = bars[0].date;
    for week in 0..8 {
        let lo = start + Duration::days(week * 5);
        let hi = lo + Duration::days(5);
        let actionable = filtered
            .iter()
            .filter(|d| d.bar.date >= lo && d.bar.date < hi && d.action != TradeAction::Hold)
            .count();
        assert!(actionable <= 2);
    }
}

#[test]
fn allocator_plans_feed_the_broker_stub() {
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64 * 2.0).collect();
    let bars = bars_from_closes(&closes);

    let model = MomentumSignalModel::new(3, 6, 0.0).unwrap();
    let filtered = model.filter_trading_slots(model.generate(&bars), 2);

    let allocator = PositionAllocator::new("TSLA", RiskBudget::new(100_000.0));
    let plan = filtered
        .iter()
        .filter(|d| d.action != TradeAction::Hold)
        .find_map(|d| allocator.propose(d, None).unwrap())
        .expect("expected at least one actionable plan");

    let broker = MockBroker::new();
    let report = broker.send_order(&plan);
    assert_eq!(report.status, OrderStatus::Filled);
    assert_eq!(report.filled_quantity, plan.quantity);
}
