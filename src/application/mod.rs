//! Application services: rendering, export and the stores behind them.

pub mod documents;
pub mod error;
pub mod export;
pub mod images;
pub mod render;
pub mod repos;
pub mod templates;
