use crate::data::PriceBar;
use crate::signals::{SignalDecision, TradeAction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalError {
    #[error("window lengths must be positive")]
    NonPositiveWindow,
    #[error("short window ({short}) must be smaller than long window ({long})")]
    WindowOrder { short: usize, long: usize },
}

//momentum signal model
//compares short-term and long-term moving averages of close prices to
//determine trend direction and strength, then throttles signal frequency
//to a target number of trades per week
#[derive(Debug, Clone)]
pub struct MomentumSignalModel {
    short_window: usize,
    long_window: usize,
    threshold: f64,
}

impl MomentumSignalModel {
    pub fn new(short_window: usize, long_window: usize, threshold: f64) -> Result<Self, SignalError> {
        if short_window == 0 || long_window == 0 {
            return Err(SignalError::NonPositiveWindow);
        }
        if short_window >= long_window {
            return Err(SignalError::WindowOrder {
                short: short_window,
                long: long_window,
            });
        }

        Ok(MomentumSignalModel {
            short_window,
            long_window,
            threshold,
        })
    }

    //generates one decision per input bar
    //bars before long_window history accumulates emit hold with score 0
    pub fn generate(&self, bars: &[PriceBar]) -> Vec<SignalDecision> {
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        let mut decisions = Vec::with_capacity(bars.len());

        for (idx, bar) in bars.iter().enumerate() {
            if idx + 1 < self.long_window {
                decisions.push(SignalDecision {
                    bar: bar.clone(),
                    action: TradeAction::Hold,
                    score: 0.0,
                    reason: "warmup".to_string(),
                });
                continue;
            }

            let history = &closes[..=idx];
            let short_avg = trailing_average(history, self.short_window);
            let long_avg = trailing_average(history, self.long_window);
            let momentum = if long_avg != 0.0 {
                (short_avg - long_avg) / long_avg
            } else {
                0.0
            };

            let (action, reason) = if momentum > self.threshold {
                (
                    TradeAction::Buy,
                    format!("short_avg({:.2}) > long_avg({:.2})", short_avg, long_avg),
                )
            } else if momentum < -self.threshold {
                (
                    TradeAction::Sell,
                    format!("short_avg({:.2}) < long_avg({:.2})", short_avg, long_avg),
                )
            } else {
                (TradeAction::Hold, "momentum within threshold".to_string())
            };

            decisions.push(SignalDecision {
                bar: bar.clone(),
                action,
                score: momentum,
                reason,
            });
        }

        decisions
    }

    //reduces signal frequency to at most max_trades_per_week actionable
    //decisions by keeping the top absolute scores per 5-bar batch
    pub fn filter_trading_slots(
        &self,
        decisions: Vec<SignalDecision>,
        max_trades_per_week: usize,
    ) -> Vec<SignalDecision> {
        //trading days per calendar week
        let bars_per_week = 5;
        let mut reduced = Vec::new();

        for batch in decisions.chunks(bars_per_week) {
            reduced.extend(select_top_n(batch, max_trades_per_week));
        }

        reduced.sort_by(|a, b| a.bar.date.cmp(&b.bar.date));
        reduced
    }
}

//mean of the trailing window, degrading to the mean of whatever history
//is available when fewer than window samples exist
fn trailing_average(series: &[f64], window: usize) -> f64 {
    let slice = if series.len() < window {
        series
    } else {
        &series[series.len() - window..]
    };
    slice.iter().sum::<f64>() / slice.len() as f64
}

//keeps the top n non-hold decisions by absolute score
//an all-hold batch keeps its single highest-scored decision for traceability
fn select_top_n(batch: &[SignalDecision], n: usize) -> Vec<SignalDecision> {
    let mut sorted: Vec<&SignalDecision> = batch.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .abs()
            .partial_cmp(&a.score.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let selected: Vec<SignalDecision> = sorted
        .iter()
        .filter(|d| d.action != TradeAction::Hold)
        .take(n)
        .map(|d| (*d).clone())
        .collect();

    if selected.is_empty() {
        return sorted.first().map(|d| (*d).clone()).into_iter().collect();
    }

    selected
}
