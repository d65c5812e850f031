//! Drift detection between a persisted workflow state and what is on disk.
//!
//! [`reconcile`] is a pure function over two snapshots. Gathering the observations is the
//! caller's job (see the engine's filesystem observer), so every rule here can be tested with
//! plain values.
//!
//! | Category | Observed addition | Observed removal |
//! |----------|-------------------|------------------|
//! | goals | tracked as `potential` | reported once, goal kept |
//! | active workflows | added | removed from state |
//! | integrations | unused record created | reported once for unused records, record kept |

mod observations;
mod reconcile;

pub use observations::{ObservedItem, Observations};
pub use reconcile::{ChangeType, DriftCategory, DriftRecord, Reconciliation, reconcile};
