//! The shellward worker.
//!
//! Sits between a web client and the network: a fixed manifest of app-shell
//! assets is installed into a versioned store, stale store versions are
//! garbage-collected at activation, and every intercepted request is
//! classified and routed through a caching strategy. Push, message, and
//! sync events are thin plumbing around the same dispatcher.

pub mod events;
pub mod lifecycle;
pub mod notify;
pub mod router;

pub use events::{Dispatched, Worker, WorkerEvent};
pub use lifecycle::{ActivationReport, Activator, InstallReport, Installer};
pub use router::{Destination, FetchRequest, RequestClass, ResponseSource, RouteResponse, Router};
