//! Domain-specific generators layered on the propx core.
//!
//! Everything here is built from the core algebra, so the shrinking
//! behavior of the underlying generators carries through: a failing CPF
//! shrinks toward the all-zero document while staying valid.

pub mod cpf;

pub use cpf::{cpf, cpf_any, mask_cpf, unmask_cpf, valid_cpf};
