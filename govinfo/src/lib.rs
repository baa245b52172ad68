pub mod client;

pub use client::{spawn_schedule, FetchedDocument, GovInfoClient, GovInfoConfig, GovInfoError};
