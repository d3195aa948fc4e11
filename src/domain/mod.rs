//! Core domain types and logic.

pub mod bar;
pub mod bar_series;
pub mod indicator;
pub mod position;
pub mod ledger;
pub mod replay;
pub mod session;
pub mod levels;
pub mod settings;
pub mod config_validation;
pub mod error;
