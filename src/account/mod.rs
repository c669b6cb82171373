//! Account module
//!
//! One `Account` per registered principal. Accounts read the shared
//! `PolicyStore` live on every state transition, so a policy change is
//! visible to all of them immediately:
//! - Password-length validation at creation
//! - Failed-attempt counting and lockout
//! - Maintenance-mode login rejection
//! - Policy-driven session expiry

pub mod auth;
pub mod types;

pub use types::{Account, AccountInfo};
