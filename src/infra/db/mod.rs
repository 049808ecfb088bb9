//! Database handle: pooled connection, migrations, health.

use std::collections::HashSet;
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr,
    EntityTrait, QueryOrder, Statement,
};
use sea_orm_migration::{seaql_migrations, MigratorTrait};

use crate::config::Config;

pub mod migrations;

pub use migrations::Migrator;

/// Shared pool plus the migration commands the CLI exposes
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Open the pool and bring the schema up to date.
    pub async fn connect(config: &Config) -> Result<Self, DbErr> {
        let db = Self::connect_without_migrations(config).await?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "Database connected and migrations applied"
        );
        Ok(db)
    }

    /// Open the pool only; the `migrate` command drives the schema itself.
    pub async fn connect_without_migrations(config: &Config) -> Result<Self, DbErr> {
        let connection = SeaDatabase::connect(pool_options(config)).await?;
        Ok(Self { connection })
    }

    /// Wrap an already open connection (in-memory SQLite in tests).
    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Cheap clone of the pool handle for services.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.connection, None).await
    }

    /// Undo the most recent migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(&self.connection, Some(1)).await
    }

    /// Every known migration in order, paired with whether it is applied.
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        let applied: HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(&self.connection)
            .await?
            .into_iter()
            .map(|row| row.version)
            .collect();

        Ok(Migrator::migrations()
            .iter()
            .map(|migration| {
                let name = migration.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect())
    }

    /// Drop every table, then apply all migrations.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(&self.connection).await
    }

    /// Round trip used by `/health`.
    pub async fn ping(&self) -> Result<(), DbErr> {
        let backend = self.connection.get_database_backend();
        self.connection
            .execute(Statement::from_string(backend, "SELECT 1".to_string()))
            .await
            .map(|_| ())
    }
}

fn pool_options(config: &Config) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.database_max_connections)
        .connect_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .sqlx_logging(false);
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_options_follow_config() {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 3,
            database_connect_timeout_secs: 2,
            ..Config::default()
        };

        let options = pool_options(&config);
        assert_eq!(options.get_url(), "sqlite::memory:");
        assert_eq!(options.get_max_connections(), Some(3));
        assert_eq!(options.get_connect_timeout(), Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn migrations_apply_and_roll_back() {
        let db = Database::connect_without_migrations(&Config {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            ..Config::default()
        })
        .await
        .unwrap();

        db.ping().await.unwrap();
        db.run_migrations().await.unwrap();

        let status = db.migration_status().await.unwrap();
        assert_eq!(status.len(), 5);
        assert!(status.iter().all(|(_, applied)| *applied));

        db.rollback_migration().await.unwrap();
        let status = db.migration_status().await.unwrap();
        assert!(!status.last().map(|(_, applied)| *applied).unwrap_or(true));
    }
}
