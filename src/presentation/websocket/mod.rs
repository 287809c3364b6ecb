//! WebSocket Gateway
//!
//! Real-time presence and direct-message delivery over WebSocket
//! connections.

pub mod gateway;
pub mod handler;
pub mod liveness;
pub mod messages;
pub mod presence;
pub mod registry;
pub mod router;
pub mod session;

pub use gateway::Gateway;
pub use handler::ws_handler;
pub use liveness::{LivenessConfig, LivenessMonitor, LivenessState};
pub use messages::{DeliveryFrame, ErrorFrame, InboundFrame, MessagePayload, PresenceFrame};
pub use presence::PresenceBroadcaster;
pub use registry::{ConnectionHandle, ConnectionId, ConnectionRegistry};
pub use router::{DeliveryReceipt, MessageRouter, RouteError};
pub use session::{run_session, CloseReason};
