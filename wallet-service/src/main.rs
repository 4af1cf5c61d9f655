use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common_auth::{IdentityResolver, JwtConfig, TokenVerifier};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use tokio::net::TcpListener;
use tracing::{info, warn};

use wallet_service::app::{build_router, AppState};
use wallet_service::config::{AppConfig, PaystackConfig};
use wallet_service::gateway::{PaymentGateway, PaystackGateway};
use wallet_service::metrics::WalletMetrics;
use wallet_service::store::{MemoryWalletStore, PgWalletStore, WalletStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let app_config = AppConfig::from_env()?;
    // Fatal at startup when the secret key is absent.
    let paystack = PaystackConfig::from_env()?;

    let verifier = build_token_verifier_from_env()?;
    let resolver = Arc::new(IdentityResolver::new(
        verifier,
        app_config.session_cookie_name.clone(),
    ));

    let store = build_store(app_config.database_url.as_deref()).await?;
    provision_store(store.as_ref()).await?;

    let gateway: Arc<dyn PaymentGateway> =
        Arc::new(PaystackGateway::new(&paystack).map_err(anyhow::Error::from)?);

    let state = AppState {
        resolver,
        gateway,
        store,
        metrics: WalletMetrics::new()?,
        currency: app_config.currency.clone(),
        callback_url: paystack.callback_url.clone(),
        webhook_secret: paystack.secret_key.clone(),
    };

    let app = build_router(state, &app_config.allowed_origins);

    let ip: std::net::IpAddr = app_config.host.parse()?;
    let addr = SocketAddr::from((ip, app_config.port));
    info!(%addr, "starting wallet-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_token_verifier_from_env() -> anyhow::Result<TokenVerifier> {
    let issuer = env::var("JWT_ISSUER").context("JWT_ISSUER must be set")?;
    let audience = env::var("JWT_AUDIENCE").context("JWT_AUDIENCE must be set")?;

    let mut config = JwtConfig::new(issuer, audience);
    if let Ok(value) = env::var("JWT_LEEWAY_SECONDS") {
        if let Ok(leeway) = value.parse::<u32>() {
            config = config.with_leeway(leeway);
        }
    }

    if let Ok(pem) = env::var("JWT_PUBLIC_KEY_PEM") {
        let verifier =
            TokenVerifier::rs256_pem(config, pem.as_bytes()).map_err(anyhow::Error::from)?;
        info!("token verifier initialised (RS256)");
        return Ok(verifier);
    }

    let secret =
        env::var("JWT_SECRET").context("either JWT_PUBLIC_KEY_PEM or JWT_SECRET must be set")?;
    info!("token verifier initialised (HS256)");
    Ok(TokenVerifier::hs256(config, secret.as_bytes()))
}

async fn build_store(database_url: Option<&str>) -> anyhow::Result<Arc<dyn WalletStore>> {
    match database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("failed to connect to database")?;
            info!("connected to database");
            Ok(Arc::new(PgWalletStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory wallet store (balances do not survive restart)");
            Ok(Arc::new(MemoryWalletStore::new()))
        }
    }
}

static PROVISIONED: OnceCell<()> = OnceCell::const_new();

/// One-time setup gate. The create-if-missing statements are themselves
/// idempotent; the cell ensures concurrent callers wait on a single run and
/// observe the same end state.
async fn provision_store(store: &dyn WalletStore) -> anyhow::Result<()> {
    PROVISIONED
        .get_or_try_init(|| async { store.ensure_provisioned().await })
        .await?;
    Ok(())
}
