//! Command definitions, registration and the global lookup index.
//!
//! - [`set`]: the per-plugin command arena (`CommandSet`, `Command`, `CommandId`)
//! - [`builder`]: the registration surface plugins use (`Registrar`, `CommandBuilder`)
//! - [`handler`]: the `CommandHandler` trait and closure adapters
//! - [`table`]: the non-owning name index across all loaded plugins

pub mod builder;
pub mod handler;
pub mod set;
pub mod table;

pub use builder::{CommandBuilder, Registrar};
pub use handler::{CommandHandler, bind};
pub use set::{Command, CommandId, CommandSet};
pub use table::CommandTable;
