//! Configuration and the data types passed between pipeline stages

pub mod config;
pub mod models;

pub use config::{AppConfig, Settings};
pub use models::{
    CategoryPlan, Digest, DigestSection, ExtractedItem, Link, Message, MessageBody, SummaryEntry,
};
