pub mod handlers;
pub mod middleware;
pub mod releases;
pub mod routes;
pub mod torrents;

pub use routes::create_router;
