//! Resmon — a lightweight host resource monitor.
//!
//! The core is a periodic sampling engine: a [`Sampler`](sampler::Sampler)
//! drives a background loop that asks a [`Collector`](collectors::Collector)
//! for an immutable [`Snapshot`](model::Snapshot) of CPU, memory, disk, and
//! network state, stores the latest one, and notifies an optional observer.
//! OS-specific counter reads live behind the collector trait; the binary
//! adds console rendering and signal-driven shutdown on top.

pub mod collectors;
pub mod error;
pub mod model;
pub mod sampler;
pub mod view;
