pub mod config;
pub mod error;
pub mod guard;
pub mod link;
pub mod queue;
pub mod report;
pub mod search;
pub mod stress;
