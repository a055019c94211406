pub mod aggregate;
mod handlers;

pub use handlers::router;
