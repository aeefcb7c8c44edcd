pub mod analytics;
pub mod config;
pub mod import;
pub mod reference;
pub mod taxonomy;
pub mod tickets;
