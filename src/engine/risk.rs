use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskConfigError {
    #[error("stop_loss_pct must lie in (0, 1], got {0}")]
    InvalidStopLoss(f64),
    #[error("trailing_stop_pct must lie in (0, 1], got {0}")]
    InvalidTrailingStop(f64),
    #[error("max_portfolio_drawdown must lie in (0, 1], got {0}")]
    InvalidMaxDrawdown(f64),
    #[error("max_position_pct must lie in (0, 1], got {0}")]
    InvalidMaxPosition(f64),
}

//risk control configuration
//percentages are fractions: stop_loss_pct 0.1 exits at a 10% loss
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskConfig {
    pub stop_loss_pct: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub max_portfolio_drawdown: Option<f64>,
    pub max_position_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            stop_loss_pct: None,
            trailing_stop_pct: None,
            max_portfolio_drawdown: None,
            max_position_pct: 0.5,
        }
    }
}

impl RiskConfig {
    //every configured percentage must lie in (0, 1]
    pub fn validate(&self) -> Result<(), RiskConfigError> {
        if let Some(pct) = self.stop_loss_pct {
            if pct <= 0.0 || pct > 1.0 {
                return Err(RiskConfigError::InvalidStopLoss(pct));
            }
        }
        if let Some(pct) = self.trailing_stop_pct {
            if pct <= 0.0 || pct > 1.0 {
                return Err(RiskConfigError::InvalidTrailingStop(pct));
            }
        }
        if let Some(pct) = self.max_portfolio_drawdown {
            if pct <= 0.0 || pct > 1.0 {
                return Err(RiskConfigError::InvalidMaxDrawdown(pct));
            }
        }
        if self.max_position_pct <= 0.0 || self.max_position_pct > 1.0 {
            return Err(RiskConfigError::InvalidMaxPosition(self.max_position_pct));
        }
        Ok(())
    }
}

//why a forced exit fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StopLoss,
    TrailingStop,
}

//read-only snapshot of the overlay counters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskStats {
    pub stop_loss_exits: u32,
    pub trailing_stop_exits: u32,
    pub drawdown_stops: u32,
    pub peak_equity: f64,
}

//per-bar risk state consulted by the enhanced engine before applying signals
//tracks entry and trailing-high prices per symbol, the running equity peak,
//and counters for each control that fired
#[derive(Debug, Clone)]
pub struct RiskOverlay {
    config: RiskConfig,
    entry_prices: HashMap<String, f64>,
    highest_prices: HashMap<String, f64>,
    peak_equity: f64,
    stop_loss_exits: u32,
    trailing_stop_exits: u32,
    drawdown_stops: u32,
}

impl RiskOverlay {
    //fails fast on an invalid configuration
    pub fn new(config: RiskConfig, initial_equity: f64) -> Result<Self, RiskConfigError> {
        config.validate()?;
        Ok(RiskOverlay {
            config,
            entry_prices: HashMap::new(),
            highest_prices: HashMap::new(),
            peak_equity: initial_equity,
            stop_loss_exits: 0,
            trailing_stop_exits: 0,
            drawdown_stops: 0,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    //checks the open position against the fixed and trailing stops
    //fixed stop takes precedence when both would trigger
    pub fn check_exit(&self, symbol: &str, current_price: f64) -> Option<StopReason> {
        let entry_price = *self.entry_prices.get(symbol)?;

        if let Some(stop_loss_pct) = self.config.stop_loss_pct {
            let loss_pct = (current_price - entry_price) / entry_price;
            if loss_pct <= -stop_loss_pct {
                return Some(StopReason::StopLoss);
            }
        }

        if let Some(trailing_stop_pct) = self.config.trailing_stop_pct {
            let highest = self
                .highest_prices
                .get(symbol)
                .copied()
                .unwrap_or(entry_price);
            let trailing_loss_pct = (current_price - highest) / highest;
            if trailing_loss_pct <= -trailing_stop_pct {
                return Some(StopReason::TrailingStop);
            }
        }

        None
    }

    //starts tracking a freshly opened position
    pub fn record_entry(&mut self, symbol: &str, price: f64) {
        self.entry_prices.insert(symbol.to_string(), price);
        self.highest_prices.insert(symbol.to_string(), price);
    }

    //stops tracking after a forced exit and bumps the matching counter
    pub fn record_exit(&mut self, symbol: &str, reason: StopReason) {
        self.entry_prices.remove(symbol);
        self.highest_prices.remove(symbol);
        match reason {
            StopReason::StopLoss => self.stop_loss_exits += 1,
            StopReason::TrailingStop => self.trailing_stop_exits += 1,
        }
    }

    //ratchets the trailing high while a position is open
    pub fn update_highest(&mut self, symbol: &str, price: f64) {
        if let Some(highest) = self.highest_prices.get_mut(symbol) {
            if price > *highest {
                *highest = price;
            }
        }
    }

    //ratchets the running equity peak
    pub fn update_peak(&mut self, equity: f64) {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    //true while equity sits at or below the configured drawdown from peak
    //new entries are suppressed; open positions are untouched
    pub fn should_halt_entries(&mut self, current_equity: f64) -> bool {
        let Some(max_drawdown) = self.config.max_portfolio_drawdown else {
            return false;
        };

        let current_drawdown = (current_equity - self.peak_equity) / self.peak_equity;
        if current_drawdown <= -max_drawdown {
            self.drawdown_stops += 1;
            return true;
        }

        false
    }

    //clamps a buy to the configured fraction of available cash
    pub fn cap_buy_quantity(&self, quantity: u32, cash: f64, price: f64) -> u32 {
        let max_quantity = (cash * self.config.max_position_pct / price) as u32;
        quantity.min(max_quantity)
    }

    pub fn stats(&self) -> RiskStats {
        RiskStats {
            stop_loss_exits: self.stop_loss_exits,
            trailing_stop_exits: self.trailing_stop_exits,
            drawdown_stops: self.drawdown_stops,
            peak_equity: self.peak_equity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejects_out_of_range_percentages() {
        let config = RiskConfig {
            stop_loss_pct: Some(0.0),
            ..RiskConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RiskConfigError::InvalidStopLoss(_))
        ));

        let config = RiskConfig {
            trailing_stop_pct: Some(1.5),
            ..RiskConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RiskConfigError::InvalidTrailingStop(_))
        ));

        let config = RiskConfig {
            max_position_pct: 0.0,
            ..RiskConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RiskConfigError::InvalidMaxPosition(_))
        ));

        assert!(RiskConfig::default().validate().is_ok());
    }

    #[test]
    fn fixed_stop_triggers_at_threshold() {
        let config = RiskConfig {
            stop_loss_pct: Some(0.10),
            ..RiskConfig::default()
        };
        let mut overlay = RiskOverlay::new(config, 100_000.0).unwrap();
        overlay.record_entry("TSLA", 100.0);

        assert_eq!(overlay.check_exit("TSLA", 95.0), None);
        assert_eq!(overlay.check_exit("TSLA", 90.0), Some(StopReason::StopLoss));
        assert_eq!(overlay.check_exit("TSLA", 89.0), Some(StopReason::StopLoss));
    }

    #[test]
    fn trailing_stop_follows_the_high() {
        let config = RiskConfig {
            trailing_stop_pct: Some(0.10),
            ..RiskConfig::default()
        };
        let mut overlay = RiskOverlay::new(config, 100_000.0).unwrap();
        overlay.record_entry("TSLA", 100.0);
        overlay.update_highest("TSLA", 150.0);

        //well above entry but 10% off the high
        assert_eq!(
            overlay.check_exit("TSLA", 135.0),
            Some(StopReason::TrailingStop)
        );
        assert_eq!(overlay.check_exit("TSLA", 140.0), None);
    }

    #[test]
    fn no_exit_without_tracked_entry() {
        let config = RiskConfig {
            stop_loss_pct: Some(0.10),
            ..RiskConfig::default()
        };
        let overlay = RiskOverlay::new(config, 100_000.0).unwrap();
        assert_eq!(overlay.check_exit("TSLA", 1.0), None);
    }

    #[test]
    fn record_exit_clears_tracking_and_counts() {
        let config = RiskConfig {
            stop_loss_pct: Some(0.10),
            ..RiskConfig::default()
        };
        let mut overlay = RiskOverlay::new(config, 100_000.0).unwrap();
        overlay.record_entry("TSLA", 100.0);
        overlay.record_exit("TSLA", StopReason::StopLoss);

        assert_eq!(overlay.check_exit("TSLA", 1.0), None);
        assert_eq!(overlay.stats().stop_loss_exits, 1);
    }

    #[test]
    fn drawdown_halt_counts_and_suppresses() {
        let config = RiskConfig {
            max_portfolio_drawdown: Some(0.30),
            ..RiskConfig::default()
        };
        let mut overlay = RiskOverlay::new(config, 100_000.0).unwrap();
        overlay.update_peak(120_000.0);

        assert!(!overlay.should_halt_entries(100_000.0));
        assert!(overlay.should_halt_entries(84_000.0));
        assert_eq!(overlay.stats().drawdown_stops, 1);
    }

    #[test]
    fn buy_quantity_is_capped_by_cash_fraction() {
        let overlay = RiskOverlay::new(RiskConfig::default(), 100_000.0).unwrap();
        //50% of 10_000 cash at $100 allows 50 shares
        assert_eq!(overlay.cap_buy_quantity(100, 10_000.0, 100.0), 50);
        assert_eq!(overlay.cap_buy_quantity(30, 10_000.0, 100.0), 30);
    }
}
