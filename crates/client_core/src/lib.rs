pub mod bus;
pub mod config;
pub mod error;
pub mod registry;
pub mod transport;
pub mod views;

pub use bus::{BusEvent, SubscriptionBus, SubscriptionHandle};
pub use error::{DecodeError, TransportError};
pub use registry::Inbound;
pub use transport::{
    ChannelTransport, ConnectionState, Connector, TransportEvent, WireDuplex, WsConnector,
};
pub use views::{Phase, RequestSink, ViewEffect};
