pub mod config;
pub mod delivery;
pub mod descriptor;
pub mod error;
pub mod fetcher;
pub mod io;
pub mod relay;
pub mod tracker;
pub mod types;

pub use error::{RelayError, Result};
pub use relay::{HttpRelay, Relay};
pub use types::{DeliveryPayload, FormResponse, TickReport};
