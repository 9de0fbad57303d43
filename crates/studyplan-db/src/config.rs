/// Where the studyplan database lives.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/studyplan";

    /// Overrides the config file's `[database] url`.
    pub const ENV_VAR: &str = "STUDYPLAN_DATABASE_URL";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Database name from the URL path, ignoring any `?query`.
    pub fn database_name(&self) -> Option<&str> {
        let (_, name) = self.split_server()?;
        let name = name.split_once('?').map_or(name, |(name, _)| name);
        (!name.is_empty()).then_some(name)
    }

    /// Same server and query, `postgres` database. `CREATE DATABASE` runs there.
    pub fn maintenance_url(&self) -> String {
        match self.split_server() {
            Some((server, name)) => {
                let query = name.split_once('?').map_or("", |(_, query)| query);
                if query.is_empty() {
                    format!("{server}/postgres")
                } else {
                    format!("{server}/postgres?{query}")
                }
            }
            None => self.database_url.clone(),
        }
    }

    /// `(scheme://authority, path-and-query)`, or `None` without a path.
    fn split_server(&self) -> Option<(&str, &str)> {
        let after_scheme = self.database_url.find("://").map_or(0, |i| i + 3);
        let slash = self.database_url[after_scheme..].find('/')? + after_scheme;
        Some((&self.database_url[..slash], &self.database_url[slash + 1..]))
    }
}
