//! WhatsApp side: gateway client, chat adapter, and the text-command
//! handler driving the download pipeline.
//!
//! The bridge process does not speak the WhatsApp wire protocol itself; it
//! talks JSON to a gateway that owns the session. Media goes up to
//! platform-managed storage first and outgoing messages reference the
//! returned descriptor, so the upload leg has its own failure mode.

pub mod adapter;
pub mod client;
pub mod handler;

pub use client::WaClient;
pub use handler::run_event_loop;
