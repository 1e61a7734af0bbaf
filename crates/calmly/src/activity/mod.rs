//! Activity log: independent persistence of discrete wellness actions.

mod models;
mod repository;
mod service;

pub use models::{Activity, ActivityType, LogActivityRequest, LogActivityResponse};
pub use repository::ActivityRepository;
pub use service::{ActivityError, ActivityService};
