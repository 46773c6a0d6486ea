//! Core domain types and logic.

pub mod ohlcv;
pub mod order;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod broker;
pub mod indicator;
pub mod signal;
pub mod tracker;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod timeframe;
pub mod config_validation;
pub mod error;
