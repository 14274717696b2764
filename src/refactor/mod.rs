//! Source refactorings shared by the rewrites.

pub mod delete;

pub use delete::{delete_stmt, delete_var};
