//! HTTP control API
//!
//! Station listing, active-station selection and an SSE feed of
//! [`onair_common::events::OnAirEvent`]s.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
