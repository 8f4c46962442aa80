//! Command-line argument parsing.
//!
//! ```text
//! rpcn-setup [show|save|create-account|reset] [--host H] [--npid N]
//!            [--password P] [--ask-password] [--timeout SECS]
//! ```

use thiserror::Error;

use crate::auth::Credentials;

/// Field values given on the command line.
///
/// Each one replaces the stored value when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOverrides {
    pub host: Option<String>,
    pub npid: Option<String>,
    pub password: Option<String>,
    /// Read the password from the terminal without echo.
    pub ask_password: bool,
}

impl CredentialOverrides {
    /// Merge the overrides over `stored`.
    pub fn apply(&self, stored: Credentials) -> Credentials {
        Credentials {
            host: self.host.clone().unwrap_or(stored.host),
            npid: self.npid.clone().unwrap_or(stored.npid),
            password: self.password.clone().unwrap_or(stored.password),
        }
    }
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Print the stored configuration (default)
    Show,
    /// Validate and store the configuration
    Save(CredentialOverrides),
    /// Store the configuration and create the account on the server
    CreateAccount {
        overrides: CredentialOverrides,
        timeout_secs: Option<u64>,
    },
    /// Remove the stored configuration
    Reset,
    /// Show version information
    Version,
    /// Show usage
    Help,
}

/// Argument parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("{0} does not take field options")]
    UnexpectedOptions(String),
}

/// Usage text printed by `--help`.
pub const USAGE: &str = "\
Usage: rpcn-setup [COMMAND] [OPTIONS]

Commands:
  show             Print the stored configuration (default)
  save             Validate and store the configuration
  create-account   Store the configuration and create the account
  reset            Remove the stored configuration

Options:
  --host <HOST>        Server address
  --npid <NPID>        Username (3-16 characters: A-Z a-z 0-9 - _)
  --password <PASS>    Password
  --ask-password       Prompt for the password
  --timeout <SECS>     Bound connect and create-account calls
  -V, --version        Show version
  -h, --help           Show this help

Environment:
  RPCN_CONFIG_DIR      Directory holding rpcn.json (default ~/.rpcn)
  RPCN_LOG             Log filter, e.g. debug or rpcn_setup=trace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Show,
    Save,
    CreateAccount,
    Reset,
}

fn take_value<I>(flag: &str, args: &mut I) -> Result<String, ArgsError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
}

/// Parse command-line arguments and return the command to execute.
///
/// `--version` and `--help` win over everything else.
///
/// # Examples
///
/// ```
/// use rpcn_setup::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["rpcn-setup".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut args = args.skip(1);
    let mut verb = None;
    let mut overrides = CredentialOverrides::default();
    let mut timeout_secs = None;
    let mut has_options = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--host" => {
                overrides.host = Some(take_value(&arg, &mut args)?);
                has_options = true;
            }
            "--npid" => {
                overrides.npid = Some(take_value(&arg, &mut args)?);
                has_options = true;
            }
            "--password" => {
                overrides.password = Some(take_value(&arg, &mut args)?);
                has_options = true;
            }
            "--ask-password" => {
                overrides.ask_password = true;
                has_options = true;
            }
            "--timeout" => {
                let value = take_value(&arg, &mut args)?;
                let secs = value.parse::<u64>().map_err(|_| ArgsError::InvalidValue {
                    flag: arg.clone(),
                    value: value.clone(),
                })?;
                timeout_secs = Some(secs);
                has_options = true;
            }
            "show" if verb.is_none() => verb = Some(Verb::Show),
            "save" if verb.is_none() => verb = Some(Verb::Save),
            "create-account" if verb.is_none() => verb = Some(Verb::CreateAccount),
            "reset" if verb.is_none() => verb = Some(Verb::Reset),
            _ => return Err(ArgsError::UnknownArgument(arg)),
        }
    }

    match verb.unwrap_or(Verb::Show) {
        Verb::Show if has_options => Err(ArgsError::UnexpectedOptions("show".to_string())),
        Verb::Reset if has_options => Err(ArgsError::UnexpectedOptions("reset".to_string())),
        Verb::Save if timeout_secs.is_some() => {
            Err(ArgsError::UnexpectedOptions("save --timeout".to_string()))
        }
        Verb::Show => Ok(CliCommand::Show),
        Verb::Reset => Ok(CliCommand::Reset),
        Verb::Save => Ok(CliCommand::Save(overrides)),
        Verb::CreateAccount => Ok(CliCommand::CreateAccount {
            overrides,
            timeout_secs,
        }),
    }
}
