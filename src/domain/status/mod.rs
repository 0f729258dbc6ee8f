pub mod entity;
pub mod invariants;

pub use entity::{ArticleStatus, StatusFlag, StatusRow};
pub use invariants::{validate_flag_name, validate_status};
