//! Token strategies: opaque HMAC codes and refresh tokens, signed access and ID tokens, and
//! the helpers that mint, persist, and report them.

pub mod hmac;
pub mod id_token;
pub mod issue;
pub mod jwe;
pub mod jwt;
pub mod keys;
pub mod opaque;

pub use hmac::{HmacAlgorithm, HmacSigner};
pub use id_token::{IdTokenStrategy, JwtIdTokenStrategy};
pub use issue::*;
pub use jwt::{AccessTokenStrategy, JwtAccessTokenStrategy};
pub use keys::{SigningKey, SigningKeySet};
pub use opaque::*;
