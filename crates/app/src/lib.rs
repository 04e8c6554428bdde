//! # alarmhub-app
//!
//! Application layer: the repository **port** and the `Store` that keeps the
//! four record collections linked.
//!
//! ## Responsibilities
//! - Define the `Repository<T>` port that storage adapters implement
//! - Load every collection and denormalize name references into shared handles
//! - Validate, normalize and persist mutations, then re-link what changed
//! - Answer schedule queries (upcoming days, upcoming alarms)
//! - Provide the default holiday calendar used to seed an empty repository
//!
//! ## Dependency rule
//! Depends on `alarmhub-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod schedule;
pub mod seed;
pub mod store;
