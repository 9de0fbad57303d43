//! One PostgreSQL server per test binary, one fresh database per test.
//!
//! `STUDYPLAN_TEST_PG_URL` (a server URL without a database path) skips the
//! container and points the tests at an existing server.

use sqlx::postgres::PgConnection;
use sqlx::{Connection, Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use studyplan_db::config::DbConfig;
use studyplan_db::pool;

const SERVER_ENV: &str = "STUDYPLAN_TEST_PG_URL";

struct Server {
    url: String,
    _container: Option<ContainerAsync<Postgres>>,
}

static SERVER: OnceCell<Server> = OnceCell::const_new();

async fn server() -> &'static Server {
    SERVER
        .get_or_init(|| async {
            if let Ok(url) = std::env::var(SERVER_ENV) {
                return Server {
                    url: url.trim_end_matches('/').to_owned(),
                    _container: None,
                };
            }
            let container = Postgres::default()
                .with_tag("17")
                .start()
                .await
                .expect("postgres container should start");
            let host = container.get_host().await.expect("container host");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("container port");
            Server {
                url: format!("postgresql://postgres:postgres@{host}:{port}"),
                _container: Some(container),
            }
        })
        .await
}

fn db_config(server: &Server, db_name: &str) -> DbConfig {
    DbConfig::new(format!("{}/{db_name}", server.url))
}

/// A migrated database named `studyplan_test_<uuid>`.
///
/// Pass the returned name to [`drop_test_db`] when the test is done.
pub async fn create_test_db() -> (PgPool, String) {
    let server = server().await;
    let db_name = format!("studyplan_test_{}", Uuid::new_v4().simple());
    let config = db_config(server, &db_name);

    let created = pool::ensure_database_exists(&config)
        .await
        .unwrap_or_else(|e| panic!("create {db_name}: {e:#}"));
    assert!(created, "{db_name} already existed");

    let pool = pool::create_pool(&config)
        .await
        .unwrap_or_else(|e| panic!("connect {db_name}: {e:#}"));
    pool::run_migrations(&pool)
        .await
        .expect("migrations should apply");
    (pool, db_name)
}

/// Drop a database made by [`create_test_db`], even if connections remain.
pub async fn drop_test_db(db_name: &str) {
    let server = server().await;
    let maintenance_url = db_config(server, db_name).maintenance_url();
    let Ok(mut conn) = PgConnection::connect(&maintenance_url).await else {
        return;
    };
    let _ = conn
        .execute(format!("DROP DATABASE IF EXISTS {db_name} WITH (FORCE)").as_str())
        .await;
    let _ = conn.close().await;
}
