//! Per-bar entry/exit decision.
//!
//! # Evaluation Semantics
//!
//! - Any undefined input (bands, oscillator or statistic) yields `Hold`
//! - With a position open, a close above the upper band asks for a sell at the close
//! - Without a position, a close below the lower band asks for a buy at the
//!   close, but only while the window looks mean reverting:
//!   `statistic < adf_threshold` and `oscillator < 0`
//!
//! Reissue on a pending side is the tracker's concern; the evaluator only
//! looks at whether a position is open.

use crate::domain::indicator::bundle::IndicatorSnapshot;
use crate::domain::tracker::TrackerState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParams {
    pub adf_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    Hold,
    Buy { limit_price: f64 },
    Sell { limit_price: f64 },
}

pub fn evaluate(snapshot: &IndicatorSnapshot, state: TrackerState, params: &SignalParams) -> Signal {
    let (Some(bands), Some(oscillator), Some(statistic)) =
        (snapshot.bands, snapshot.oscillator, snapshot.statistic)
    else {
        return Signal::Hold;
    };
    let close = snapshot.close;

    if state.has_position() {
        if close > bands.upper {
            return Signal::Sell { limit_price: close };
        }
        return Signal::Hold;
    }

    let mean_reverting = statistic < params.adf_threshold && oscillator < 0.0;
    if mean_reverting && close < bands.lower {
        Signal::Buy { limit_price: close }
    } else {
        Signal::Hold
    }
}
