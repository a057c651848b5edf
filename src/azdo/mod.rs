//! Azure DevOps work-item tracking client.
//!
//! Covers the two endpoints the export needs: saved query results and
//! per-item detail with relations expanded.

mod client;

pub use client::{AzdoClient, WorkItemDetail};
