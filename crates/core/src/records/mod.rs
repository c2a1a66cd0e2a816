//! Records module - canonical record model and storage traits.

mod memory_repository;
mod records_model;
mod records_traits;


pub use memory_repository::InMemoryRecordRepository;
pub use records_model::{FragmentKind, Record, RecordFields, Target};
pub use records_traits::RecordRepositoryTrait;
