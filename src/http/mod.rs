//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID and trace layers)
//!     → request.rs (capture method, URI, headers, body)
//!     → dispatcher.rs (route → select endpoint → forward, retry once)
//!     → forward.rs (pooled HTTP/1.1 client call)
//!     → upstream response relayed to the client
//! ```

pub mod dispatcher;
pub mod forward;
pub mod request;
pub mod server;

pub use dispatcher::{DispatchSettings, Dispatcher};
pub use forward::{ForwardError, Forwarder, HttpForwarder};
pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
