pub mod classifier;
pub mod cli;
pub mod error;
pub mod fmt;
pub mod matcher;
pub mod models;
pub mod normalizer;
pub mod predictor;
pub mod session;
pub mod settings;
pub mod sheet;
