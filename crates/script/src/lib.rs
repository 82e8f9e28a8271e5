//! Signature hashing, P2PKH signing and signed messages.

pub mod message;
mod secp;
pub mod sighash;
pub mod sign;
pub mod standard;
