//! Metadata and saved-filter services on [`Jira`](crate::Jira).
//!
//! Each submodule adds methods to the handle. Reference data goes through
//! the handle's [`MetadataCache`](crate::cache::MetadataCache) and is
//! fetched at most once per handle. Filters and screens are not cached.

mod fields;
mod filters;
mod lookups;
mod projects;
mod screens;
mod users;
