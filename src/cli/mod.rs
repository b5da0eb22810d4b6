mod commands;
mod handlers;

pub use commands::{ClientArgs, Cli, Commands, ServeArgs};
pub use handlers::{handle_fields, handle_get, handle_serve, handle_set, handle_show};
