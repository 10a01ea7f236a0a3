pub mod analyzers;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod joiner;
pub mod models;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod roster;
pub mod subjects;
