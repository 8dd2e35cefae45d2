#[cfg(unix)]
use std::{fs, path::Path};

use actix_web::{middleware::Logger, web, App, HttpServer};
use package_tracker_domain::config::{ApiConfig, ConfigError};
use package_tracker_domain::services::{
    init_telemetry, TelemetryConfig, TelemetryError, TokenIssuer,
};
use package_tracker_domain::storage::StorageError;
use package_tracker_storage::SeaOrmStorage;
use thiserror::Error;
use tracing::info;

use crate::{
    handlers::{configure_public, metrics_handler},
    state::AppState,
};

/// Where a listener accepts connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenTarget<'a> {
    Tcp(&'a str),
    #[cfg(unix)]
    Unix(&'a str),
}

pub async fn run() -> Result<(), BootstrapError> {
    let config = ApiConfig::load_from_env()?;
    let telemetry = init_telemetry(&TelemetryConfig::from_env("API"))?;

    let mut storage = SeaOrmStorage::builder().database_url(config.database_url());
    if let Some(max) = config.database_max_connections() {
        storage = storage.max_connections(max);
    }
    let storage = storage.build().await?;
    let issuer = TokenIssuer::new(config.auth().clone());
    let state = AppState::new(storage, issuer, telemetry);

    // Metrics stay off the public listener whenever an internal one exists.
    let metrics_on_public = !config.has_internal_listener();
    let timeout = config.request_timeout();

    let public_state = state.clone();
    let public_server = HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(public_state.clone()))
            .wrap(Logger::default())
            .configure(configure_public);
        if metrics_on_public {
            app.route("/metrics", web::get().to(metrics_handler))
        } else {
            app
        }
    })
    .client_request_timeout(timeout);

    let public_target = public_target(&config)?;
    info!(listener = ?public_target, "starting public listener");
    let public_server = match public_target {
        ListenTarget::Tcp(addr) => public_server.bind(addr)?,
        #[cfg(unix)]
        ListenTarget::Unix(path) => {
            cleanup_socket(path)?;
            public_server.bind_uds(path)?
        }
    }
    .run();

    let internal_server = match internal_target(&config)? {
        Some(target) => {
            let internal_state = state.clone();
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(internal_state.clone()))
                    .wrap(Logger::default())
                    .route("/metrics", web::get().to(metrics_handler))
            })
            .client_request_timeout(timeout);

            info!(listener = ?target, "starting internal listener");
            let server = match target {
                ListenTarget::Tcp(addr) => server.bind(addr)?,
                #[cfg(unix)]
                ListenTarget::Unix(path) => {
                    cleanup_socket(path)?;
                    server.bind_uds(path)?
                }
            };
            Some(server.run())
        }
        None => None,
    };

    match internal_server {
        Some(internal) => {
            tokio::try_join!(public_server, internal)?;
        }
        None => public_server.await?,
    }

    Ok(())
}

fn public_target(config: &ApiConfig) -> Result<ListenTarget<'_>, BootstrapError> {
    match config.api_unix_socket() {
        Some(socket) => unix_target(socket),
        None => Ok(ListenTarget::Tcp(config.api_bind_address())),
    }
}

fn internal_target(config: &ApiConfig) -> Result<Option<ListenTarget<'_>>, BootstrapError> {
    if let Some(socket) = config.internal_unix_socket() {
        return unix_target(socket).map(Some);
    }
    Ok(config.internal_bind_address().map(ListenTarget::Tcp))
}

#[cfg(unix)]
fn unix_target(socket: &str) -> Result<ListenTarget<'_>, BootstrapError> {
    Ok(ListenTarget::Unix(socket))
}

#[cfg(not(unix))]
fn unix_target(socket: &str) -> Result<ListenTarget<'_>, BootstrapError> {
    Err(BootstrapError::Io(std::io::Error::other(format!(
        "unix socket '{socket}' requested but this platform does not support it"
    ))))
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A socket file left over from an unclean shutdown makes `bind_uds` fail.
#[cfg(unix)]
fn cleanup_socket(path: &str) -> std::io::Result<()> {
    let socket_path = Path::new(path);
    if socket_path.exists() {
        fs::remove_file(socket_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[actix_web::test]
    async fn cleanup_socket_removes_stale_file() {
        let path = std::env::temp_dir().join(format!(
            "package-tracker-test-{}-{}.sock",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, b"stub").expect("write socket file");
        cleanup_socket(path.to_str().unwrap()).expect("cleanup succeeds");
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn unix_target_wraps_socket_path() {
        assert_eq!(
            unix_target("/tmp/api.sock").unwrap(),
            ListenTarget::Unix("/tmp/api.sock")
        );
    }
}
