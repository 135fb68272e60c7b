//! Shared test helpers for integration tests using Testcontainers.

use sqlx::MySqlPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::mysql::Mysql;

use routine_load_admin::config::ConnectionParams;

/// A test database backed by a Testcontainers MySQL instance.
///
/// The container is automatically cleaned up when `TestDb` is dropped.
pub struct TestDb {
    pub pool: MySqlPool,
    pub params: ConnectionParams,
    _container: ContainerAsync<Mysql>,
}

#[allow(dead_code)]
impl TestDb {
    /// Start a fresh MySQL container and connect to it as `root`.
    pub async fn new() -> Self {
        let container = Mysql::default()
            .start()
            .await
            .expect("Failed to start MySQL container");

        let port = container
            .get_host_port_ipv4(3306)
            .await
            .expect("Failed to get mapped port");

        let params = ConnectionParams {
            host: "127.0.0.1".to_string(),
            user: "root".to_string(),
            password: String::new(),
            port,
        };

        let pool = MySqlPool::connect(&format!("mysql://root@127.0.0.1:{}/mysql", port))
            .await
            .expect("Failed to connect to test database");

        TestDb {
            pool,
            params,
            _container: container,
        }
    }

    /// Execute a SQL statement.
    pub async fn execute(&self, sql: &str) {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .unwrap_or_else(|e| panic!("SQL execution failed: {}\nSQL: {}", e, sql));
    }
}

/// Parameters pointing at a port nothing listens on.
#[allow(dead_code)]
pub fn unreachable_params() -> ConnectionParams {
    ConnectionParams {
        host: "127.0.0.1".to_string(),
        user: "root".to_string(),
        password: String::new(),
        port: 1,
    }
}
