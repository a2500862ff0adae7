pub mod connection;
pub mod error;
pub mod frame;
pub mod route;
pub mod server;

// Re-export commonly used types
pub use connection::{MultiplexedConnection, ResponseStream};
pub use error::TransportError;
pub use frame::{Frame, StreamId};
pub use route::{ORDERS_ROUTE, RouteTemplate};
pub use server::{PayloadStream, RequestHandler, serve};
