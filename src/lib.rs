pub mod backoff;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod output;
pub mod poller;
pub mod prober;
pub mod report;
pub mod state;
pub mod verifier;
