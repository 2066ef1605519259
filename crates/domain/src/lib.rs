//! # growhub-domain
//!
//! Pure domain model for the growhub enclosure controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Actuators** (the closed set of on/off outputs and their pin table)
//! - Define **Readings** and **Thresholds**, including the hysteresis decision
//! - Define **Commands** from the three origins and their outcomes
//! - Define **Snapshots** (consistent views published outward)
//! - Define **Audit records** (readings, commands, system events)
//! - Parse **Payloads** (inbound request bodies shared by every transport)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod actuator;
pub mod audit;
pub mod command;
pub mod payload;
pub mod reading;
pub mod snapshot;
pub mod threshold;
