//! Receiving side of the Pong state sync: snapshot vault, interpolation,
//! RTT/bandwidth monitoring and a headless WebSocket runtime.

pub mod config;
pub mod error;
pub mod interpolation;
pub mod monitor;
pub mod net;
pub mod session;
pub mod vault;

pub use config::ClientConfig;
pub use error::ClientError;
pub use interpolation::{EntityKind, Field, InterpolatedEntity, InterpolatedState, Interpolator};
pub use monitor::{BandwidthMonitor, RttMonitor};
pub use net::run;
pub use session::{ClientSession, Inbound, RenderFrame, Stats};
pub use vault::Vault;
