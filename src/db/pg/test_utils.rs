use sqlx::{PgPool, migrate};
use std::sync::Arc;

use crate::db::Data;

use super::PgData;

/// A throwaway database created for a single test and dropped afterwards.
pub struct TestDb {
    pub data: Data,
    db_name: String,
    test_pool: PgPool,
}

fn server_url() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    database_url
        .rsplit_once('/')
        .map(|(base, _)| base.to_owned())
        .unwrap_or(database_url)
}

impl TestDb {
    /// Creates `test_{ulid}` through the `postgres` admin database and runs
    /// the migrations on it.
    pub async fn new() -> Self {
        let server_url = server_url();

        let admin_pool = PgPool::connect(&format!("{server_url}/postgres"))
            .await
            .expect("Failed to connect to postgres database");

        let db_name = format!("test_{}", ulid::Ulid::new().to_string().to_lowercase());

        sqlx::query(&format!("CREATE DATABASE {db_name}"))
            .execute(&admin_pool)
            .await
            .expect("Failed to create test database");

        admin_pool.close().await;

        let test_pool = PgPool::connect(&format!("{server_url}/{db_name}"))
            .await
            .expect("Failed to connect to test database");

        migrate!("./src/db/pg/migrations")
            .run(&test_pool)
            .await
            .expect("Failed to run migrations");

        let data: Data = Arc::new(PgData::from_pool(test_pool.clone()));

        TestDb {
            data,
            db_name,
            test_pool,
        }
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let db_name = self.db_name.clone();
        let test_pool = self.test_pool.clone();
        let admin_url = format!("{}/postgres", server_url());

        // Not joined: blocking here hangs parallel tests.
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create cleanup runtime");

            rt.block_on(async {
                test_pool.close().await;

                if let Ok(admin_pool) = PgPool::connect(&admin_url).await {
                    let _ =
                        sqlx::query(&format!("DROP DATABASE IF EXISTS {db_name} WITH (FORCE)"))
                            .execute(&admin_pool)
                            .await;

                    admin_pool.close().await;
                }
            });
        });
    }
}
