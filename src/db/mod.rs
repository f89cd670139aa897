// =====================================================
// DATABASE MODULE
// Literal formatting and statement generation
// =====================================================

pub mod sql_utils;
pub mod statements;

pub use crate::db_types::*;
