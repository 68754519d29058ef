//! Implementations of the ports for development and tests.
//!
//! - **InMemoryTaskStore**: document store with an atomic conditional update
//! - **InMemoryDeliveryQueue**: at-least-once transport with delayed redelivery
//! - **RandomGate / FixedGate**: resource gates
//! - **NoopGenerator**: stub generation backend

pub mod gate;
pub mod generator;
pub mod inmem_delivery;
pub mod inmem_store;

pub use self::gate::{FixedGate, RandomGate};
pub use self::generator::NoopGenerator;
pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::inmem_store::InMemoryTaskStore;
