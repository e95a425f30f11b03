pub mod middleware;
pub mod router;
pub mod types;
pub mod handlers {
    pub mod devices;
    pub mod health;
    pub mod info;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
