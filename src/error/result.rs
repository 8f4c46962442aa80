//! Result type alias for RPCN operations.

use super::rpcn_error::RpcnError;

/// Type alias for Results using RpcnError.
pub type RpcnResult<T> = Result<T, RpcnError>;
