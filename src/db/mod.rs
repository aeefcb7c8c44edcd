pub mod functions;
pub mod insert;
pub mod migrations;
pub mod queries;
pub mod reference;
pub mod sequence;
pub mod setup;
pub mod tickets;
