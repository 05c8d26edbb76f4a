mod institution;
mod verifier;

pub use institution::Institution;
pub use verifier::Verifier;
