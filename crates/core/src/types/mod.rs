//! Core types for the pet shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cep;
pub mod id;
pub mod money;
pub mod pet;
pub mod status;

pub use cep::{Cep, CepError};
pub use id::*;
pub use money::{format_brl, round_money};
pub use pet::PetType;
pub use status::*;
