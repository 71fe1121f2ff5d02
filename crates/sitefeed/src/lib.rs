pub mod config;
pub mod parser;
pub mod pipeline;
pub mod scraper;
pub mod types;
pub mod writer;

pub use config::{PipelineConfig, Profile, SourceConfig};
pub use pipeline::{PipelineError, RunReport, SourceOutcome, fetch_and_write, run};
pub use crate::scraper::{FetchError, PageSource, WebScraper};
