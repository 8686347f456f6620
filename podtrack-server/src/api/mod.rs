//! HTTP API modules

pub mod episodes;
pub mod health;
pub mod notifications;
pub mod podcasts;
pub mod tasks;
pub mod users;
pub mod workflow;

pub use episodes::episode_routes;
pub use health::health_routes;
pub use notifications::notification_routes;
pub use podcasts::podcast_routes;
pub use tasks::task_routes;
pub use users::user_routes;
pub use workflow::workflow_routes;

use serde::Deserialize;

/// Common skip/limit query parameters for list endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}
