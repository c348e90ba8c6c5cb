//! Notification request intake gateway.
//!
//! `POST /request` takes a [`models::NotificationRequest`], checks the
//! caller's bearer credential against the credential store and enqueues the
//! request. `GET /health` reports liveness only.

pub mod config;
pub mod forward;
pub mod http;
mod main_logic;
pub mod models;
pub mod reqid;

pub use http::{GatewayState, IntakeError, build_router, process_request};
pub use main_logic::run;
pub use requestor_bus::{BusClient, BusError, InMemoryBusClient, JetStreamBusClient, PublishReceipt};
