use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//represents a single daily ohlcv bar of market data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    //creates a new PriceBar with validation
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        //validate high >= low
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        //validate close within [low, high]
        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        //validate open within [low, high]
        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        //validate non-negative volume
        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    //creates a PriceBar without validation
    pub fn new_unchecked(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    #[test]
    fn valid_bar_is_accepted() {
        let bar = PriceBar::new(date(1), 100.0, 105.0, 98.0, 102.0, 1_000.0).unwrap();
        assert_eq!(bar.close, 102.0);
    }

    #[test]
    fn high_below_low_is_rejected() {
        let err = PriceBar::new(date(1), 96.0, 95.0, 98.0, 96.0, 1_000.0).unwrap_err();
        assert!(matches!(err, BarError::InvalidHighLow { .. }));
    }

    #[test]
    fn close_outside_range_is_rejected() {
        let err = PriceBar::new(date(1), 100.0, 105.0, 98.0, 110.0, 1_000.0).unwrap_err();
        assert!(matches!(err, BarError::InvalidClose { .. }));
    }

    #[test]
    fn negative_volume_is_rejected() {
        let err = PriceBar::new(date(1), 100.0, 105.0, 98.0, 102.0, -1.0).unwrap_err();
        assert!(matches!(err, BarError::NegativeVolume(_)));
    }
}
