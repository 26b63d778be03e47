// Import module - brokerage lot exports, investment lists and trade confirmations

pub mod fidelity_lots;
pub mod investments_csv;
pub mod trade_confirmation;

use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::InputError;

pub use fidelity_lots::{parse_lot_line, parse_lots, parse_lots_file};
pub use investments_csv::{parse_investments_csv, InvestmentRow};
pub use trade_confirmation::{parse_confirmation, TradeConfirmation};

/// Read a whole input file, mapping a missing file to [`InputError::FileNotFound`]
pub fn read_input<P: AsRef<Path>>(path: P) -> Result<String, InputError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(InputError::FileNotFound(path.display().to_string()));
    }
    info!("Reading input file: {:?}", path);
    Ok(fs::read_to_string(path)?)
}
