use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ConfigManager;
use member_portal::MemberPortal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::var("MEMBER_PORTAL_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            ConfigManager::from_file(&path)?
        }
        Err(_) => ConfigManager::new()?,
    };

    let portal = MemberPortal::new(config)?;
    portal.serve().await?;

    info!("Member portal stopped");
    Ok(())
}
