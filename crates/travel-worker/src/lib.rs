//! # travel-worker
//!
//! Reference tool worker for the travel agent. Speaks line-delimited
//! JSON-RPC on stdin/stdout and serves three tools backed by a
//! deterministic data source:
//!
//! ```text
//! agent ──tools/call──▶ ToolServer ──▶ ToolRegistry ──▶ Tool ──▶ TravelData
//!       ◀──content────                                            (mock)
//! ```
//!
//! | Tool                 | Arguments                       |
//! |----------------------|---------------------------------|
//! | `get_weather`        | `city`                          |
//! | `get_flight_details` | `origin`, `destination`, `date` |
//! | `generate_itinerary` | `city`, `days?`, `activities?`  |

pub mod data;
pub mod error;
pub mod server;
pub mod tool;
pub mod tools;

pub use error::{Result, WorkerError};
pub use server::ToolServer;
pub use tool::{Tool, ToolRegistry};
