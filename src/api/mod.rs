pub mod errors;
pub mod routes;
pub mod server;

pub use errors::ApiError;
pub use routes::configure;
pub use server::start_api_server;
