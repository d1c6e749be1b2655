use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{Res, api, config::Settings, error::ExportError, types::AuthSession};

pub async fn start_api_server(
    state: Arc<Mutex<Option<AuthSession>>>,
    settings: Settings,
    callback_path: String,
) -> Res<()> {
    let addr = SocketAddr::from_str(&settings.server_address).map_err(|e| {
        ExportError::Config(format!(
            "Failed to parse server address '{}': {}",
            settings.server_address, e
        ))
    })?;

    let app = Router::new()
        .route(&callback_path, get(api::callback))
        .layer(Extension(state))
        .layer(Extension(settings));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
