pub mod config;
pub mod logging;

pub mod aggregate;
pub mod batcher;
pub mod input;
pub mod lookup;
pub mod output;
pub mod pipeline;
pub mod retry;
pub mod url_model;
