//! Client for the mapping admin API.

mod client;

pub use client::{AdminClient, ClientError, HistoryEntry, StatusReply, ValidationReply};
