use rpcn_setup::account::{AccountCreationOptions, AccountCreator};
use rpcn_setup::adapters::{FileCredentialsProvider, WsRpcnClient};
use rpcn_setup::cli::{
    handle_create_account, handle_reset, handle_save, handle_show, parse_args,
    render_credentials, version_line, CliCommand, USAGE,
};
use rpcn_setup::connection::{PumpConfig, SessionRegistry};
use rpcn_setup::error::{RpcnError, RpcnResult, ACCOUNT_CREATED_MESSAGE, ACCOUNT_CREATED_TITLE};

use color_eyre::Result;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "RPCN_LOG";

/// How long to wait for pump tasks when exiting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(err: &RpcnError) -> ! {
    tracing::debug!(
        code = err.error_code(),
        category = %err.category(),
        local = err.is_local(),
        "command failed: {}",
        err
    );
    eprintln!("{}", err.report());
    std::process::exit(1);
}

async fn dispatch(command: CliCommand) -> RpcnResult<()> {
    let provider = FileCredentialsProvider::new()?;

    match command {
        CliCommand::Show => {
            let creds = handle_show(&provider).await?;
            println!("Config:   {}", provider.credentials_path().display());
            println!("{}", render_credentials(&creds));
        }
        CliCommand::Save(overrides) => {
            let creds = handle_save(&provider, &overrides).await?;
            println!("Saved configuration for {} on {}", creds.npid, creds.host);
        }
        CliCommand::CreateAccount {
            overrides,
            timeout_secs,
        } => {
            let mut options = AccountCreationOptions::default();
            if let Some(secs) = timeout_secs {
                let timeout = Duration::from_secs(secs);
                options = options
                    .with_connect_timeout(timeout)
                    .with_request_timeout(timeout);
            }

            let registry = SessionRegistry::shared(PumpConfig::default());
            let creator = AccountCreator::new(provider, registry.clone()).with_options(options);
            let result = handle_create_account(&creator, WsRpcnClient::new(), &overrides).await;

            let report = registry.shutdown(SHUTDOWN_GRACE).await;
            if report.timed_out > 0 {
                tracing::warn!("{} connection pump(s) did not stop in time", report.timed_out);
            }

            result?;
            println!("{}: {}", ACCOUNT_CREATED_TITLE, ACCOUNT_CREATED_MESSAGE);
        }
        CliCommand::Reset => {
            handle_reset(&provider).await?;
            println!("Removed {}", provider.credentials_path().display());
        }
        CliCommand::Version | CliCommand::Help => {}
    }

    Ok(())
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    // Handle --version and --help before any initialization
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        _ => {}
    }

    color_eyre::install()?;
    init_tracing();

    let runtime = tokio::runtime::Runtime::new()?;
    if let Err(e) = runtime.block_on(dispatch(command)) {
        report(&e);
    }

    Ok(())
}
