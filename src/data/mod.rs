pub mod bar;
pub mod loader;

pub use bar::{BarError, PriceBar};
pub use loader::load_csv;
