//! Closed message enums for every context boundary.
//!
//! Two transports exist: frame messaging (`postMessage`-style, carried in an
//! [`Envelope`]) and the extension bus (request/response with a
//! [`Responder`]). Each has its own enum so an endpoint matches exhaustively
//! over exactly the messages it can receive.

mod bus;
mod control;
mod frame;

pub use bus::{BrokerMessage, BusResponse, Responder, TabMessage};
pub use control::ControlCommand;
pub use frame::{Envelope, FrameMessage, ResponseBody};

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
