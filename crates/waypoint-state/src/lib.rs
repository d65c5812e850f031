//! Durable workflow state for waypoint.
//!
//! [`WorkflowState`] is the single persisted record per project path. It is always passed
//! by value: callers load it through [`StateManager`], mutate a copy, and save it back.

pub mod custom_data;
pub mod domain;
mod manager;
mod migration;
mod mutations;
pub mod ordered_map;
pub mod state;

pub use custom_data::{CustomData, GenericData, GoalDetail, ProjectManagementData, SpecDrivenData};
pub use domain::{DomainDefinition, PhaseDefinition, WorkflowType};
pub use manager::StateManager;
pub use ordered_map::OrderedMap;
pub use state::{
    Blocker, DriftLedger, GoalLists, GoalStage, IntegrationRecord, PhaseState, PhaseStatus,
    STATE_VERSION, TransitionRecord, WorkflowState,
};
