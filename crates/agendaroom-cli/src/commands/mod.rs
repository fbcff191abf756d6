pub mod agenda;
pub mod config;
pub mod meeting;
pub mod timer;
