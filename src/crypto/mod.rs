//! Key material and address derivation.
//!
//! The search core treats this module as an external collaborator: it only
//! needs a fresh `(secret key, address)` pair per attempt. Workers pull pairs
//! through the [`KeySource`] trait so the engine can be driven by a fixed or
//! failing source in tests.

mod address;
mod keypair;

pub use address::Address;
pub use keypair::{KeyError, KeySource, Keypair, Secp256k1Source};
