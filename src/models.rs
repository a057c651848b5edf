//! Data models for the time report exporter.
//!
//! This module contains the core structures shared by the pipeline
//! stages: tickets, hierarchy edges, and per-ticket time buckets.

use std::collections::HashMap;

/// A top-level work item gathered from the saved query.
///
/// All fields are text: missing source fields default to empty rather
/// than failing, and numeric values (Priority) are rendered as plain
/// decimal strings. Time columns are attached only at serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Work-item id, as returned by the saved query.
    pub id: String,
    /// `System.Title`
    pub title: String,
    /// `System.State`
    pub state: String,
    /// `System.WorkItemType`
    pub work_item_type: String,
    /// `Microsoft.VSTS.Common.Priority`
    pub priority: String,
    /// `Custom.EstimatedDevelopmentTime`
    pub estimated_dev: String,
    /// `Custom.EstimatedTestingTime`
    pub estimated_test: String,
}

/// Activity classification of a single worklog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Dev,
    Test,
    Other,
}

/// Per-ticket accumulator of logged seconds.
///
/// `total` moves with every recorded entry, together with exactly one
/// of the category counters, so `total == dev + test + other` holds at
/// all times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBucket {
    pub total: u64,
    pub dev: u64,
    pub test: u64,
    pub other: u64,
}

impl TimeBucket {
    /// Record one worklog entry.
    pub fn record(&mut self, seconds: u64, kind: ActivityKind) {
        self.total += seconds;
        match kind {
            ActivityKind::Dev => self.dev += seconds,
            ActivityKind::Test => self.test += seconds,
            ActivityKind::Other => self.other += seconds,
        }
    }
}

/// Parent → child edges collected during work-item expansion.
///
/// Edges are kept in the order they were recorded so that the inverted
/// lookup is deterministic: a child that appears under two parents
/// resolves to the parent processed last.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    edges: Vec<(String, String)>,
}

impl Hierarchy {
    /// Record a forward hierarchy link from `parent` to `child`.
    pub fn add_edge(&mut self, parent: &str, child: &str) {
        self.edges.push((parent.to_string(), child.to_string()));
    }

    /// All child ids, in recording order. May contain duplicates when
    /// the source data lists a child under two parents.
    pub fn all_children(&self) -> Vec<String> {
        self.edges.iter().map(|(_, child)| child.clone()).collect()
    }

    /// Invert into a child → parent lookup. Last recorded parent wins.
    pub fn invert(&self) -> HashMap<String, String> {
        let mut lookup = HashMap::new();
        for (parent, child) in &self.edges {
            lookup.insert(child.clone(), parent.clone());
        }
        lookup
    }

    /// Number of recorded parent → child links.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
