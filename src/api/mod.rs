pub mod brapi_handlers;
pub mod crop_interceptor;
pub mod handlers;
pub mod json_extractor;
pub mod program_extractor;
pub mod routes;
pub mod state;
pub mod variable_handlers;

pub use json_extractor::ApiJson;
pub use program_extractor::*;
pub use routes::*;
pub use state::*;
