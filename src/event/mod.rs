//! CloudEvents representation and HTTP binding.
//!
//! # Data Flow
//! ```text
//! Inbound request (headers + body)
//!     → codec::decode / codec::decode_lenient
//!     → Event (attributes + optional data)
//!     → dispatch core / handler
//!     → codec::encode
//!     → Outbound response (ce-* headers + JSON body)
//! ```
//!
//! # Design Decisions
//! - Attribute names are stored lower-case and without the `ce-` prefix
//! - Only the function proxy needs parsed data; the other modes tolerate raw bodies
//! - Events are immutable once dispatch begins (handlers receive an owned copy)

pub mod codec;

pub use codec::{decode, decode_lenient, encode, CodecError, Encoded, Event, ATTRIBUTE_PREFIX};
