//! Services built on the storage collaborators.

mod collector;
mod consistency;
mod responses;
pub mod visibility;

pub use collector::ResponseCollector;
pub use consistency::{CascadeSummary, ConsistencyCoordinator};
pub use responses::ResponsesLogic;
pub use visibility::{is_name_visible_to_user, is_response_visible_to_students};
