//! Typed records for document-store rows and the ingest API.
//!
//! Rows arrive as loose JSON objects. Every converter checks them against the
//! record's fields: missing required fields, wrong types and unknown keys are
//! all rejected.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

/// A record type that can be built from a row.
pub trait Record: DeserializeOwned {
    const KIND: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub collection: Option<String>,
    pub source_url: Option<String>,
    pub published_at: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub ordinal: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    pub id: String,
    pub document_id: String,
    pub text: String,
    pub label: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Relation {
    pub id: String,
    pub source_entity_id: String,
    pub target_entity_id: String,
    pub relation_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub id: String,
    pub document_id: String,
    pub ordinal: u32,
    pub heading: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Action {
    pub id: String,
    pub document_id: String,
    pub action_type: String,
    pub action_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePosition {
    Yea,
    Nay,
    Present,
    NotVoting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vote {
    pub id: String,
    pub action_id: String,
    pub member: String,
    pub position: VotePosition,
}

/// Body of `POST /ingest/pdf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PdfIn {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestResult {
    pub ingested: String,
    pub chunks: u32,
}

macro_rules! record {
    ($($ty:ident => $kind:literal, $from_row:ident;)*) => {
        $(
            impl Record for $ty {
                const KIND: &'static str = $kind;
            }

            pub fn $from_row(row: Row) -> Result<$ty> {
                record_from_row(row)
            }
        )*
    };
}

record! {
    Document => "document", document_from_row;
    Chunk => "chunk", chunk_from_row;
    Entity => "entity", entity_from_row;
    Relation => "relation", relation_from_row;
    Section => "section", section_from_row;
    Action => "action", action_from_row;
    Vote => "vote", vote_from_row;
}

/// Validate a row against `T`. Absent optional fields become `None`; any
/// other mismatch is an `Error::Record`.
pub fn record_from_row<T: Record>(row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| Error::Record { kind: T::KIND, reason: e.to_string() })
}
