//! Member portal runtime
//!
//! Wires the configuration, the in-memory store behind the bounded
//! connection pool, the access-control components, and the HTTP router into
//! one application, and serves it.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use api_gateway::{AppState, LogMailer};
use common::error::{Error, Result};
use common::models::{Permission, Role};
use common::types::{catalog, MemberStatus, PermissionId, RoleId};
use config::ConfigManager;
use security::tokens::TOKEN_TTL_SECS;
use security::{
    CredentialVerifier, DelegationEngine, DirectorTermManager, PermissionAggregator, TokenIssuer,
    TokenKeys,
};
use storage_adapter::memory::{Database, MemoryStore};
use storage_adapter::pool::{ConnectionPool, DEFAULT_POOL_SIZE};
use storage_adapter::store::{MemberStore, PasswordResetStore, PermissionStore, RoleStore};
use storage_adapter::transaction::TransactionCoordinator;

/// Director roles seeded into an empty store
const DIRECTOR_ROLES: [(u32, &str); 5] = [
    (1, "Chairperson"),
    (2, "Vice Chairperson"),
    (3, "Treasurer"),
    (4, "Internal Affairs Director"),
    (5, "External Affairs Director"),
];

/// The assembled member portal application
pub struct MemberPortal {
    /// Runtime configuration
    config: Arc<ConfigManager>,

    /// The table set everything reads through the pool
    database: Arc<Database>,

    /// Shared handler state
    state: Arc<AppState>,
}

impl MemberPortal {
    /// Creates the portal, loading the token key pair from the configured paths
    pub fn new(config: ConfigManager) -> Result<Self> {
        let private_path = config
            .get_string("jwt_private_key_path")
            .ok_or_else(|| Error::Storage("jwt_private_key_path is not set".to_string()))?;
        let public_path = config
            .get_string("jwt_public_key_path")
            .ok_or_else(|| Error::Storage("jwt_public_key_path is not set".to_string()))?;
        let keys = TokenKeys::from_pem_files(&private_path, &public_path)?;
        Self::with_keys(config, keys)
    }

    /// Creates the portal with an already-built token key pair
    pub fn with_keys(config: ConfigManager, keys: TokenKeys) -> Result<Self> {
        let config = Arc::new(config);

        let database = Arc::new(Database::new());
        let pool_size = config.get_usize("db_pool_size").unwrap_or(DEFAULT_POOL_SIZE);
        let pool = Arc::new(ConnectionPool::new(database.clone(), pool_size));
        let store = Arc::new(MemoryStore::new(pool.clone()));
        let coordinator = Arc::new(TransactionCoordinator::new(pool));

        let members: Arc<dyn MemberStore> = store.clone();
        let permissions: Arc<dyn PermissionStore> = store.clone();
        let roles: Arc<dyn RoleStore> = store.clone();
        let resets: Arc<dyn PasswordResetStore> = store;

        let token_ttl_secs = config.get_i64("token_expiry_secs").unwrap_or(TOKEN_TTL_SECS);

        let state = Arc::new(AppState {
            verifier: CredentialVerifier::new(members.clone()),
            aggregator: PermissionAggregator::new(members.clone(), roles.clone()),
            delegation: DelegationEngine::new(members.clone(), permissions.clone()),
            terms: DirectorTermManager::new(members.clone(), roles.clone(), coordinator.clone()),
            tokens: TokenIssuer::with_ttl(Arc::new(keys), token_ttl_secs),
            members,
            permissions,
            roles,
            resets,
            coordinator,
            mailer: Arc::new(LogMailer),
            is_production: config.get_bool("is_production").unwrap_or(false),
            api_path: config
                .get_string("api_path")
                .unwrap_or_else(|| "/api".to_string()),
            token_ttl_secs,
        });

        let portal = Self {
            config,
            database,
            state,
        };
        portal.seed()?;
        Ok(portal)
    }

    /// Fills an empty store with the permission catalog, the director
    /// roles, and a bootstrap admin if one is configured
    fn seed(&self) -> Result<()> {
        let bootstrap_secret = self.config.get_string("bootstrap_admin_password");

        self.database.write(|tables| {
            if tables.permissions.is_empty() {
                for id in catalog::ALL_PERMISSIONS {
                    tables.permissions.insert(
                        id,
                        Permission {
                            id,
                            name: catalog_name(id),
                            description: None,
                        },
                    );
                }
                info!("Seeded {} catalog permissions", tables.permissions.len());
            }

            if tables.roles.is_empty() {
                for (id, name) in DIRECTOR_ROLES {
                    let id = RoleId(id);
                    tables.roles.insert(
                        id,
                        Role {
                            id,
                            name: name.to_string(),
                        },
                    );
                }
            }

            if tables.members.is_empty() {
                match bootstrap_secret {
                    Some(secret) => {
                        let hash = CredentialVerifier::hash_secret(&secret)?;
                        let id = tables.insert_member(
                            "admin".to_string(),
                            "admin@member-portal.local".to_string(),
                            hash,
                            MemberStatus::Active,
                        )?;
                        tables.add_grant(id, catalog::ADMIN, true);
                        warn!("Bootstrap admin member {} created", id);
                    }
                    None => warn!(
                        "Store has no members; set MEMBER_PORTAL_BOOTSTRAP_ADMIN_PASSWORD \
                         to create a bootstrap admin"
                    ),
                }
            }

            Ok(())
        })
    }

    /// The HTTP router of the portal
    pub fn router(&self) -> Router {
        api_gateway::router(self.state.clone())
    }

    /// Shared handler state, for embedding and tests
    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Direct table access, for seeding and tests
    pub fn database(&self) -> Arc<Database> {
        self.database.clone()
    }

    /// Serves the portal until interrupted
    pub async fn serve(&self) -> Result<()> {
        let bind_address = self
            .config
            .get_string("bind_address")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string());
        let addr: SocketAddr = bind_address
            .parse()
            .map_err(|e| Error::Storage(format!("Invalid bind address {}: {}", bind_address, e)))?;

        info!("Member portal listening on {}", addr);
        axum::Server::bind(&addr)
            .serve(self.router().into_make_service())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received");
            })
            .await
            .map_err(|e| Error::Storage(format!("Server error: {}", e)))
    }
}

/// Human-readable names of the seeded permission catalog
fn catalog_name(id: PermissionId) -> String {
    match id {
        catalog::MEMBER_ADMINISTRATION => "Member administration".to_string(),
        catalog::TRAINEE_ADMINISTRATION => "Trainee administration".to_string(),
        catalog::PROJECT_ADMINISTRATION => "Project administration".to_string(),
        catalog::EVENT_ADMINISTRATION => "Event administration".to_string(),
        catalog::FINANCE_DATA => "Finance data access".to_string(),
        catalog::NEWSLETTER_DISPATCH => "Newsletter dispatch".to_string(),
        catalog::WORKSHOP_ADMINISTRATION => "Workshop administration".to_string(),
        catalog::DOCUMENT_ADMINISTRATION => "Document administration".to_string(),
        catalog::ADMIN => "Administrator".to_string(),
        other => format!("Permission {}", other),
    }
}
