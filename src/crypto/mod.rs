pub mod signer;

pub use signer::{KeyPaths, PublicVerifier, Signer};
