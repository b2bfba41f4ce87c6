//! Trading signal derived from the classifier output

use serde::Serialize;
use std::fmt;

/// Human-readable trading recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Sell / Hold")]
    SellHold,
}

impl Signal {
    /// Map a raw model output to a signal: only class `1` means buy
    pub fn from_prediction(prediction: i64) -> Self {
        if prediction == 1 {
            Signal::Buy
        } else {
            Signal::SellHold
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::Buy => "Buy",
            Signal::SellHold => "Sell / Hold",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
