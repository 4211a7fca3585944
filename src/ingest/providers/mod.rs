// src/ingest/providers/mod.rs
pub mod gdacs_rss;
pub mod news_api;
pub mod reliefweb;
pub mod usgs;

pub use gdacs_rss::GdacsRssConnector;
pub use news_api::NewsApiConnector;
pub use reliefweb::ReliefWebConnector;
pub use usgs::UsgsConnector;
