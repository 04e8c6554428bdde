//! # alarmhub-domain
//!
//! Pure domain model for the alarmhub scheduler.
//!
//! ## Responsibilities
//! - Foundational types: record kinds, name references, error conventions, clock helpers
//! - Define **Actions** (pin toggles, bus writes, HTTP requests, file writes, composites)
//! - Define **Day selectors** (recurring calendar rules) and resolve them to dates
//! - Define **Day groups** (named sets of day selectors)
//! - Define **Alarms** (an action fired at a time of day on selected days)
//! - Link records together (denormalize) and strip links for storage (normalize)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod link;
pub mod record;
pub mod reference;
pub mod time;

pub mod action;
pub mod alarm;
pub mod day_group;
pub mod day_selector;
pub mod lunar;
