//! Account creation against an RPCN server.

pub mod flow;

pub use flow::{
    AccountCreated, AccountCreation, AccountCreationOptions, AccountCreationState, AccountCreator,
    DEFAULT_AVATAR_URL,
};
