pub mod cache;
pub mod config;
pub mod enrich;
pub mod families;
pub mod fetch;
pub mod parser;
pub mod pipeline;
pub mod search;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::Settings;
pub use families::Registry;
pub use fetch::WebFetcher;
pub use pipeline::{Pipeline, Stage};
pub use search::DuckDuckGo;
pub use store::Store;

pub(crate) const BASE_URL: &str = "https://en.wikipedia.org";
