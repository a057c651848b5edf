//! 7pace Timetracker OData client.

mod client;

pub use client::{ActivityRef, TimeHubClient, Worklog};
