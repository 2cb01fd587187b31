//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header or URI authority)
//!     → matcher.rs (host key, suffix candidates)
//!     → router.rs (table lookup)
//!     → Return: RoutingEntry or NoRoute
//!
//! Table Compilation (at startup):
//!     dispatcher document / single expression
//!     → config::validation (compile every entry)
//!     → Freeze as immutable RoutingTable
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime (shared without locks)
//! - Host keys are exact, case-sensitive matches
//! - Fallback strips trailing labels of the same key, never tries other hosts

pub mod matcher;
pub mod router;

pub use matcher::{host_candidates, request_host, suffix_lookup};
pub use router::{EntryKind, RoutingEntry, RoutingTable};
