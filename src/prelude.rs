//! Prelude module for convenient imports
//!
//! Import everything you need with: `use crm_gateway::prelude::*;`

// Domain types
pub use crate::domain::{Customer, CustomerId, CustomerOrder, DomainError, Order, OrderId};

// Storage types
pub use crate::storage::{
    KeyedOrderStore, OrderLookup, OrderQueryHandler, OrderStoreConfig, StorageError,
};

// Transport types
pub use crate::transport::{
    Frame, MultiplexedConnection, ORDERS_ROUTE, RequestHandler, RouteTemplate, TransportError,
};

// Client types
pub use crate::client::{
    ClientError, CustomerFeed, CustomerSourceReader, CustomerTransport, FileCustomerTransport,
    InMemoryCustomerTransport, OrderSource, OrderStreamClient, RetryPolicy,
};

// Engine types
pub use crate::engine::{EngineError, OrderJoiner};

// IO types
pub use crate::io::{CsvCustomerStream, IoError, JsonLinesWriter};

// Streaming types
pub use crate::streaming::{
    AbortOnError, Aggregator, FailurePolicy, IsolateErrors, JoinedStream, SilentIsolate,
};

// App types
pub use crate::app::{AppError, CliApp, GatewayConfig, Writers, init_logging};
