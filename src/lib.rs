//! Breakeven - interest-adjusted breakeven prices for brokerage lots
//!
//! This library computes the minimum sale price at which each lot beats a
//! savings account, and compares lots or portfolios against benchmark
//! symbols and every S&P 500 constituent.

pub mod basis;
pub mod bulk;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod evaluator;
pub mod importers;
pub mod models;
pub mod pricing;
pub mod reports;
pub mod ui;
pub mod universe;
pub mod utils;
