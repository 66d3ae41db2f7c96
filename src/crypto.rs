mod scheme;
mod signer;
mod verifier;

#[cfg(test)]
pub(crate) mod test_keys;

pub use scheme::*;
pub use signer::*;
pub use verifier::*;
