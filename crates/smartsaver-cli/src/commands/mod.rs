pub mod config;
pub mod menu;
pub mod run;
pub mod simulate;
