use std::fmt;

use anyhow::Result;

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct ReplicationRole {
    pub name: String,
    pub password: String,
}

// Keep the password out of logs and error messages.
impl fmt::Debug for ReplicationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationRole")
            .field("name", &self.name)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ReplicationRole {
    pub fn new(name: &str, password: &str) -> Self {
        ReplicationRole {
            name: name.to_string(),
            password: password.to_string(),
        }
    }

    pub fn exists_statement(&self) -> String {
        format!(
            "SELECT 1 FROM pg_roles WHERE rolname = {}",
            quote_literal(&self.name)
        )
    }

    pub fn create_statement(&self) -> String {
        format!(
            "CREATE ROLE {} WITH REPLICATION LOGIN PASSWORD {}",
            quote_ident(&self.name),
            quote_literal(&self.password)
        )
    }

    pub fn exists<C: Catalog + ?Sized>(&self, catalog: &mut C) -> Result<bool> {
        Ok(catalog.scalar(&self.exists_statement())?.is_some())
    }

    /// Creates the role unless it is already present. Returns whether it was created.
    pub fn ensure<C: Catalog + ?Sized>(&self, catalog: &mut C) -> Result<bool> {
        if self.exists(catalog)? {
            tracing::info!(role = %self.name, "replication role already exists");
            return Ok(false);
        }
        catalog.execute(&self.create_statement())?;
        tracing::info!(role = %self.name, "created replication role");
        Ok(true)
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
