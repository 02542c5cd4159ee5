//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is shared by every test in a binary. Each test
//! gets its own freshly migrated database inside it, so page and search
//! assertions never see rows written by a neighbouring test.

use anyhow::{Context, Result};
use axum::Router;
use server_core::kernel::ServerDeps;
use server_core::server::build_app_with_deps;
use server_core::ServerSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use url::Url;
use uuid::Uuid;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    host: String,
    port: u16,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

/// Global shared infrastructure - initialized once, reused by all tests.
static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=300"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?.to_string();
        let port = postgres.get_host_port_ipv4(5432).await?;

        Ok(Self {
            host,
            port,
            _postgres: postgres,
        })
    }

    fn database_url(&self, database: &str) -> String {
        format!(
            "postgresql://postgres:postgres@{}:{}/{}",
            self.host, self.port, database
        )
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Per-test database plus helpers to build the app around it.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let app = ctx.app();
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    /// Database pool - use this for test fixtures.
    pub db_pool: PgPool,
    pub settings: ServerSettings,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    /// Create a fresh database in the shared container and migrate it.
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let database = format!("test_{}", Uuid::new_v4().simple());
        let admin = PgPool::connect(&infra.database_url("postgres"))
            .await
            .context("Failed to connect to admin database")?;
        sqlx::query(&format!("CREATE DATABASE {}", database))
            .execute(&admin)
            .await
            .context("Failed to create test database")?;
        admin.close().await;

        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&infra.database_url(&database))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_pool,
            settings: ServerSettings::default(),
        })
    }

    pub fn deps(&self) -> ServerDeps {
        ServerDeps::new(self.db_pool.clone(), self.settings.clone())
    }

    /// Router for `tower::ServiceExt::oneshot` tests.
    pub fn app(&self) -> Router {
        build_app_with_deps(self.deps())
    }

    /// Serve the app on an ephemeral local port and return its base URL.
    pub async fn spawn_server(&self) -> Result<Url> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let app = self.app();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Test server stopped");
            }
        });

        Ok(Url::parse(&format!("http://{}/", addr))?)
    }
}
