//! URL handling module for Whose-Domain
//!
//! Root normalization, link canonicalization and the registrable-domain
//! comparison used to split discovered links into internal and external sets.

mod domain;
mod normalize;

pub use domain::registrable_domain;
pub use normalize::{normalize_link, normalize_root};
