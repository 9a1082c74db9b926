mod endpoint;
mod serve;

pub use endpoint::run_endpoint;
pub use serve::run_serve;
