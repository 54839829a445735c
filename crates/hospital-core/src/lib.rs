//! Typed CRUD client core for the hospital admin screens.
//!
//! This crate holds everything between a route path and the backend REST
//! resource: route matching and authorization, entity resolution, the edit
//! session's save protocol, and the transport that carries it all.
//!
//! # Modules
//!
//! - [`entity`]: `Entity` trait and the `Hospital` record
//! - [`envelope`]: response envelopes and paging parameters
//! - [`error`]: `Error`, `SaveError` and the `Result` alias
//! - [`transport`]: `EntityTransport` and its HTTP, retry and mock implementations
//! - [`resolver`]: fetch-or-blank entity resolution
//! - [`session`]: edit session state machine
//! - [`detail`], [`list`], [`delete`]: the remaining screens
//! - [`navigation`]: return-to-previous-context hook
//! - [`routes`], [`router`]: route table, access gate and activation

#![doc = include_str!("../README.md")]

pub mod delete;
pub mod detail;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod list;
pub mod navigation;
pub mod resolver;
pub mod router;
pub mod routes;
pub mod session;
pub mod transport;

// Re-export key types at crate root for convenience
pub use delete::DeleteDialog;
pub use detail::DetailView;
pub use entity::{Entity, Hospital, HospitalId};
pub use envelope::{Alert, Direction, Envelope, PageRequest};
pub use error::{Error, Result, SaveError};
pub use list::ListView;
pub use navigation::{History, Navigator};
pub use resolver::{EntityResolver, Resolution};
pub use router::{Activation, Redirect, ResolutionFallback, Router};
pub use routes::{AccessGate, AuthorityGate, ROLE_USER, RouteDef, RouteKind, RouteTable};
pub use session::{EditSession, Phase, SaveKind, SaveOutcome};
pub use transport::{EntityTransport, HttpTransport, MockTransport, RetryTransport};
