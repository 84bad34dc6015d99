use crate::engine::RiskConfig;
use crate::portfolio::RiskBudget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

//momentum signal model parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalParams {
    pub short_window: usize,
    pub long_window: usize,
    pub threshold: f64,
    pub max_trades_per_week: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        SignalParams {
            short_window: 3,
            long_window: 6,
            threshold: 0.01,
            max_trades_per_week: 2,
        }
    }
}

//complete backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    pub symbol: String,

    //account settings
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub risk_free_rate: f64,

    //strategy
    pub signal: SignalParams,
    pub risk_budget: RiskBudget,

    //optional risk overlay; absent means the base engine
    pub risk: Option<RiskConfig>,

    //optional output paths
    pub output_equity_csv: Option<PathBuf>,
    pub output_trades_csv: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data.csv"),
            symbol: "TSLA".to_string(),
            initial_cash: 100_000.0,
            commission_rate: 0.001,
            risk_free_rate: 0.02,
            signal: SignalParams::default(),
            risk_budget: RiskBudget::new(100_000.0),
            risk: None,
            output_equity_csv: None,
            output_trades_csv: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
