//! Request, session, and response value types plus the protocol vocabulary.

pub mod endpoint;
pub mod id;
pub mod request;
pub mod response;
pub mod scope;
pub mod session;
pub mod vocab;

pub use endpoint::*;
pub use id::*;
pub use request::*;
pub use response::Response;
pub use scope::*;
pub use session::*;
pub use vocab::*;

/// Free-form JSON claim map.
pub type Claims = serde_json::Map<String, serde_json::Value>;
