//! Veilcast shared wire contracts.
//!
//! Message types exchanged over the realtime sync socket, used by both the
//! sync client and any server implementation. Domain vocabulary comes from
//! `veilcast-domain`; this crate only pins the wire shapes.

mod messages;

pub use messages::{ClientMessage, EmptyData, FogEventData, ServerMessage};
