//! SQL access to the local server.
//!
//! [`PsqlCatalog`] shells out to `psql` as the cluster owner, which works on a
//! stock install with peer authentication. [`ClientCatalog`] talks to the
//! server directly when an admin connection URI is configured.

use anyhow::{Context, Result};
use postgres::{Client, NoTls, SimpleQueryMessage};

use crate::system::{Invocation, System};

pub trait Catalog {
    /// Single value of a one-row, one-column query, or `None` when no row came back.
    /// A value spanning several lines is returned whole.
    fn scalar(&mut self, sql: &str) -> Result<Option<String>>;

    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Human-readable result table.
    fn render(&mut self, sql: &str) -> Result<String>;
}

pub struct PsqlCatalog<'a, S: System + ?Sized> {
    system: &'a S,
    os_user: String,
}

impl<'a, S: System + ?Sized> PsqlCatalog<'a, S> {
    pub fn new(system: &'a S, os_user: &str) -> Self {
        PsqlCatalog {
            system,
            os_user: os_user.to_string(),
        }
    }

    fn psql(&self) -> Invocation {
        Invocation::as_user(&self.os_user, "psql").args(["-X", "-v", "ON_ERROR_STOP=1"])
    }
}

impl<S: System + ?Sized> Catalog for PsqlCatalog<'_, S> {
    fn scalar(&mut self, sql: &str) -> Result<Option<String>> {
        let invocation = self.psql().args(["-q", "-A", "-t", "-c", sql]);
        let completed = self.system.run_checked(&invocation)?;
        let value = completed.stdout.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let invocation = self.psql().args(["-q", "-c", sql]);
        self.system.run_checked(&invocation)?;
        Ok(())
    }

    fn render(&mut self, sql: &str) -> Result<String> {
        let invocation = self.psql().args(["-c", sql]);
        Ok(self.system.run_checked(&invocation)?.stdout)
    }
}

impl Catalog for Client {
    fn scalar(&mut self, sql: &str) -> Result<Option<String>> {
        for message in self.simple_query(sql)? {
            if let SimpleQueryMessage::Row(row) = message {
                return Ok(Some(row.get(0).unwrap_or_default().to_string()));
            }
        }
        Ok(None)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.batch_execute(sql)?;
        Ok(())
    }

    fn render(&mut self, sql: &str) -> Result<String> {
        let mut columns = Vec::new();
        let mut rows = Vec::new();
        for message in self.simple_query(sql)? {
            match message {
                // Sent even when no rows follow, so the header survives an empty result.
                SimpleQueryMessage::RowDescription(description) => {
                    columns = description
                        .iter()
                        .map(|column| column.name().to_string())
                        .collect();
                }
                SimpleQueryMessage::Row(row) => {
                    let values = (0..row.len())
                        .map(|i| row.get(i).unwrap_or_default().to_string())
                        .collect();
                    rows.push(values);
                }
                _ => {}
            }
        }
        Ok(render_table(&columns, &rows))
    }
}

/// Direct connection, opened on first use so the server may still be down
/// when the catalog is built.
pub struct ClientCatalog {
    url: String,
    client: Option<Client>,
}

impl ClientCatalog {
    pub fn new(url: &str) -> Self {
        ClientCatalog {
            url: url.to_string(),
            client: None,
        }
    }

    fn client(&mut self) -> Result<&mut Client> {
        if self.client.is_none() {
            let client =
                Client::connect(&self.url, NoTls).context("failed to connect to the server")?;
            self.client = Some(client);
        }
        self.client
            .as_mut()
            .context("connection was not established")
    }
}

impl Catalog for ClientCatalog {
    fn scalar(&mut self, sql: &str) -> Result<Option<String>> {
        self.client()?.scalar(sql)
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        Catalog::execute(self.client()?, sql)
    }

    fn render(&mut self, sql: &str) -> Result<String> {
        self.client()?.render(sql)
    }
}

/// Lays out rows the way psql's aligned format does.
pub fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }
    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!(" {value:<width$} "))
            .collect::<Vec<_>>()
            .join("|")
            .trim_end()
            .to_string()
    };
    let mut out = String::new();
    if !columns.is_empty() {
        out.push_str(&line(columns));
        out.push('\n');
        let rule = widths
            .iter()
            .map(|width| "-".repeat(width + 2))
            .collect::<Vec<_>>()
            .join("+");
        out.push_str(&rule);
        out.push('\n');
    }
    for row in rows {
        out.push_str(&line(row.as_slice()));
        out.push('\n');
    }
    let noun = if rows.len() == 1 { "row" } else { "rows" };
    out.push_str(&format!("({} {})\n", rows.len(), noun));
    out
}
