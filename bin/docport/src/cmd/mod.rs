//! Command implementations.

pub mod build;
pub mod check;
pub mod preview;
pub mod serve;

use std::net::SocketAddr;

use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;

/// Bind the listening socket for a server command.
pub(crate) async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))
}
