//! # Repository Module
//!
//! One repository per entity, each a thin async wrapper over the in-memory
//! record store. Every repository clones records out on read so no lock is
//! held while callers compute.

pub mod audit;
pub mod movement;
pub mod product;
pub mod sale;

pub use audit::{AuditRepository, DamageRepository};
pub use movement::MovementRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;
