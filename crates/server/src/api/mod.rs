pub mod handlers;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod words;
pub mod worker;
pub mod ws;

pub use routes::create_router;
pub use ws::{WsBroadcaster, WsMessage};
