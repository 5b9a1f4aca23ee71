//! Node identity

mod identity;

pub use identity::IdentityIndex;
