//! Command-line interface for rpcn-setup.
//!
//! `main` parses arguments with [`parse_args`], then calls one of the
//! handlers in [`commands`] and prints what it returns:
//!
//! ```ignore
//! use rpcn_setup::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => println!("{}", version_line()),
//!     CliCommand::Show => { /* handle_show */ }
//!     _ => { /* ... */ }
//! }
//! ```

pub mod args;
pub mod commands;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, CredentialOverrides, USAGE};
pub use commands::{
    handle_create_account, handle_reset, handle_save, handle_show, prompt_password,
    render_credentials, resolve_credentials,
};
pub use version::{version_line, VERSION};
