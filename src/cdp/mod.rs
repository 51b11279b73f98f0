//! CDP (Chrome DevTools Protocol) layer
//!
//! WebSocket plumbing to the backing browser. The engine above this layer only
//! sees the `portal::PortalPage` trait; everything here is transport detail.

pub mod browser;
pub mod client;
pub mod connection;
pub mod mock;
pub mod traits;
pub mod types;

pub use browser::DevToolsBrowser;
pub use client::CdpClient;
pub use connection::CdpWebSocketConnection;
pub use traits::CdpConnection;
pub use types::EvaluationResult;
