//! Command-line parsing as seen by the binary.

use rpcn_setup::auth::Credentials;
use rpcn_setup::cli::{parse_args, version_line, ArgsError, CliCommand, USAGE};

fn args(list: &[&str]) -> impl Iterator<Item = String> {
    std::iter::once("rpcn-setup".to_string())
        .chain(list.iter().map(|s| s.to_string()))
        .collect::<Vec<_>>()
        .into_iter()
}

#[test]
fn test_version_flag() {
    assert_eq!(parse_args(args(&["--version"])), Ok(CliCommand::Version));
    assert!(version_line().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_usage_lists_every_command() {
    for command in ["show", "save", "create-account", "reset"] {
        assert!(USAGE.contains(command), "usage is missing {}", command);
    }
}

#[test]
fn test_create_account_overrides_merge_with_stored() {
    let command = parse_args(args(&[
        "create-account",
        "--host",
        "rpcn.example.org",
        "--npid",
        "Player_1",
    ]))
    .unwrap();

    let CliCommand::CreateAccount { overrides, timeout_secs } = command else {
        panic!("expected create-account");
    };
    assert_eq!(timeout_secs, None);

    let merged = overrides.apply(Credentials::new("old.example.org", "Old", "kept"));
    assert_eq!(merged, Credentials::new("rpcn.example.org", "Player_1", "kept"));
}

#[test]
fn test_reset_rejects_field_options() {
    assert_eq!(
        parse_args(args(&["reset", "--npid", "x"])),
        Err(ArgsError::UnexpectedOptions("reset".to_string()))
    );
}
