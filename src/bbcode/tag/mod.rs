//! Substitution stages, one module per marker family.

pub(super) mod inline;
pub(super) mod link;
pub(super) mod quote;
