mod error;

pub use self::error::PoolError;

use core::num::NonZeroUsize;

use diesel::ConnectionError;
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{
        AsyncDieselConnectionManager, ManagerConfig,
        deadpool::{Object, Pool},
    },
};
use rustls::{ClientConfig, RootCertStore};
use rustls_native_certs::CertificateResult;
use tokio::task;
use tokio_postgres_rustls::MakeRustlsConnect;

/// Pool of PostgreSQL connections shared by every repository call.
pub type DbPool = Pool<AsyncPgConnection>;

/// A pooled connection, returned to the pool on drop.
pub type DbConn = Object<AsyncPgConnection>;

/// Builds a pool of at most `max_size` connections to `url`.
///
/// Connections negotiate TLS against the platform's native roots when the server offers it.
/// No connection is opened until the first checkout.
///
/// # Errors
///
/// Fails when the certificate loading task panics or the pool configuration is rejected.
#[tracing::instrument(skip(url), fields(max_size = max_size.get()))]
pub async fn establish_pool<U>(url: U, max_size: NonZeroUsize) -> Result<DbPool, PoolError>
where
    String: From<U>,
{
    let tls = task::spawn_blocking(make_rustls_config).await?;

    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup = Box::new(move |url: &str| {
        let tls = tls.clone();
        let url = url.to_string();
        Box::pin(async move {
            let (client, conn) = tokio_postgres::connect(&url, tls)
                .await
                .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::warn!("postgres connection closed: {e}");
                }
            });

            AsyncPgConnection::try_from(client).await
        })
    });

    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(String::from(url), manager_config);

    Ok(Pool::builder(manager).max_size(max_size.get()).build()?)
}

fn make_rustls_config() -> MakeRustlsConnect {
    let CertificateResult { certs, errors, .. } = rustls_native_certs::load_native_certs();

    for error in errors {
        tracing::warn!("skipping unreadable native certificate: {error}");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(certs);

    tracing::debug!(added, ignored, "native root certificates loaded");

    let config = ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();

    MakeRustlsConnect::new(config)
}
