// src/config/mod.rs
pub mod run;
pub mod scrape;

pub use run::RunConfig;
pub use scrape::{load_profile_default, load_profile_from, ScrapeProfile};
