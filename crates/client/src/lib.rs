pub mod client;
pub mod config;
pub mod error;
pub mod lock;
pub mod server;

pub use client::Client;
pub use config::ClientConfig;
pub use error::ClientError;
pub use lock::{CommandGuard, CommandLock};
pub use server::{Capabilities, Cardinality, CodecDescriptor, IoFormat, ParseResult, Server};
