//! Ports: the seams to external systems.
//!
//! Each trait hides a collaborator (document store, job transport, the
//! accelerator, the generation backend, time, id allocation) so the lifecycle
//! engine can be driven by in-memory implementations in development and tests.

pub mod clock;
pub mod delivery_queue;
pub mod generator;
pub mod id_generator;
pub mod resource_gate;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::delivery_queue::DeliveryQueue;
pub use self::generator::Generator;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::resource_gate::ResourceGate;
pub use self::task_store::TaskStore;
