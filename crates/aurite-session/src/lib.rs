//! Session Store (C2): keyed persistence of agent/workflow execution
//! records, cascade delete, and retention sweep. See spec.md §4.2 and
//! SPEC_FULL.md §3.

mod model;
mod sanitize;
mod store;

pub use model::{Session, SessionKind};
pub use sanitize::sanitize_session_id;
pub use store::{SessionFilter, SessionStore};
