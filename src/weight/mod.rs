pub mod dto;
mod handlers;

pub use handlers::router;
