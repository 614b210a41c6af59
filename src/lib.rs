pub mod cli;
pub mod config;
pub mod kiosk;
pub mod services;
pub mod spa;
pub mod ui;
