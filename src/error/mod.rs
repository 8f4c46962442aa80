//! Unified error handling.
//!
//! | Error | Detected | Category |
//! |-------|----------|----------|
//! | Validation | before any network call | User |
//! | ConnectFailed | `connect` | Network |
//! | CreateAccountFailed | `create_user` | Server or Network |
//! | Storage | load/save | System or Configuration |
//!
//! No error is retried automatically.

mod category;
mod result;
mod rpcn_error;

pub use category::ErrorCategory;
pub use result::RpcnResult;
pub use rpcn_error::{RpcnError, ACCOUNT_CREATED_MESSAGE, ACCOUNT_CREATED_TITLE};
