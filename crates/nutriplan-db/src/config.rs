use std::env;

/// Database configuration.
///
/// Reads from the `NUTRIPLAN_DATABASE_URL` environment variable, falling back
/// to `postgresql://localhost:5432/nutriplan` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/nutriplan";

    /// Name of the environment variable consulted by [`DbConfig::from_env`].
    pub const ENV_VAR: &str = "NUTRIPLAN_DATABASE_URL";

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        let database_url =
            env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (CLI flags, config file, tests).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The URL split before its `?` query string, if any.
    fn split_query(&self) -> (&str, &str) {
        match self.database_url.find('?') {
            Some(pos) => self.database_url.split_at(pos),
            None => (self.database_url.as_str(), ""),
        }
    }

    /// Byte offset where the URL path starts, after `scheme://authority`.
    fn path_start(base: &str) -> usize {
        let authority = base.find("://").map_or(0, |pos| pos + 3);
        base[authority..]
            .find('/')
            .map_or(base.len(), |pos| authority + pos)
    }

    /// Database named by the URL path. `None` when the URL has no path.
    pub fn database_name(&self) -> Option<&str> {
        let (base, _) = self.split_query();
        base.get(Self::path_start(base) + 1..)
            .filter(|name| !name.is_empty())
    }

    /// URL of the `postgres` maintenance database on the same server, with
    /// the same query parameters.
    pub fn maintenance_url(&self) -> String {
        let (base, query) = self.split_query();
        format!("{}/postgres{query}", &base[..Self::path_start(base)])
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(cfg.database_url, "postgresql://localhost:5432/nutriplan");
        assert_eq!(cfg.database_name(), Some("nutriplan"));
    }

    #[test]
    fn maintenance_url_replaces_db() {
        let cfg = DbConfig::new("postgresql://db.internal:5433/plans");
        assert_eq!(cfg.maintenance_url(), "postgresql://db.internal:5433/postgres");
    }

    #[test]
    fn database_name_missing_when_url_has_no_path() {
        let cfg = DbConfig::new("postgresql://localhost:5432");
        assert_eq!(cfg.database_name(), None);
        assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres");
    }

    #[test]
    fn query_string_is_kept_off_the_name() {
        let cfg = DbConfig::new("postgresql://me:secret@db/plans?sslmode=require");
        assert_eq!(cfg.database_name(), Some("plans"));
        assert_eq!(
            cfg.maintenance_url(),
            "postgresql://me:secret@db/postgres?sslmode=require"
        );
    }
}
