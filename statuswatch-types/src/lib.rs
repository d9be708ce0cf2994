//! # statuswatch-types
//!
//! Core types shared by status pollers: the identity of a tracked entity,
//! its status token, and the transition record produced when a status
//! changes between two snapshots.
//!
//! ## Features
//!
//! - `serde`: serialization of [`EntityId`] and [`Status`] via serde
//!
//! ## Example
//!
//! ```rust
//! use statuswatch_types::{EntityId, Status, Transition};
//! use std::time::Instant;
//!
//! let transition = Transition::new(
//!     EntityId::from(42),
//!     Status::from("PENDING"),
//!     Status::from("APPROVED"),
//!     Instant::now(),
//! );
//!
//! assert_eq!(transition.entity_id, EntityId::Int(42));
//! assert!(transition.is_change());
//! ```

mod entity;
mod status;
mod transition;

pub use entity::*;
pub use status::*;
pub use transition::*;
