//! Plugins shipped with the runtime.

pub mod admin;

pub use admin::{ADMIN_PLUGIN, AdminPlugin};
