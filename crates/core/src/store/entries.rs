//! SQLite implementation of the store capability.
//!
//! Namespaces live in the `namespaces` table; entries cascade with them.

use async_trait::async_trait;
use http::StatusCode;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Transaction};
use tokio_rusqlite::params;
use url::Url;

use super::connection::CacheDb;
use super::key::RequestKey;
use super::{CacheStore, namespace_not_open};
use crate::Error;
use crate::request::Response;

/// Row shape shared by both lookup queries.
const SELECT_ENTRY: &str = "SELECT e.url, e.status, e.headers_json, e.body, e.response_url FROM entries e";

struct EntryRow {
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
    response_url: String,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            status: row.get(1)?,
            headers_json: row.get(2)?,
            body: row.get(3)?,
            response_url: row.get(4)?,
        })
    }

    fn into_response(self) -> Result<Response, Error> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| Error::CorruptEntry(format!("{}: {e}", self.url)))?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;
        Ok(Response { url: self.response_url, status, headers, body: self.body.into() })
    }
}

fn namespace_exists(conn: &rusqlite::Connection, namespace: &str) -> Result<bool, Error> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM namespaces WHERE name = ?1)",
        params![namespace],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn insert_entry(tx: &Transaction<'_>, namespace: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    tx.execute(
        "INSERT INTO entries (
            namespace, key_hash, method, url, status, headers_json, body, response_url, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(namespace, key_hash) DO UPDATE SET
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            response_url = excluded.response_url,
            stored_at = excluded.stored_at",
        params![
            namespace,
            key.digest(),
            RequestKey::METHOD,
            key.url(),
            response.status.as_u16(),
            headers_json,
            response.body.as_ref(),
            &response.url,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
                    params![namespace, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, namespace: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let namespace = namespace.to_string();
        let digest = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        &format!("{SELECT_ENTRY} WHERE e.namespace = ?1 AND e.key_hash = ?2"),
                        params![namespace, digest],
                        EntryRow::from_row,
                    )
                    .optional()?;
                row.map(EntryRow::into_response).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let digest = key.digest();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        &format!(
                            "{SELECT_ENTRY} JOIN namespaces n ON n.name = e.namespace
                             WHERE e.key_hash = ?1 ORDER BY n.rowid ASC LIMIT 1"
                        ),
                        params![digest],
                        EntryRow::from_row,
                    )
                    .optional()?;
                row.map(EntryRow::into_response).transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        self.put_batch(namespace, &[(key.clone(), response.clone())]).await
    }

    async fn put_batch(&self, namespace: &str, entries: &[(RequestKey, Response)]) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let entries = entries.to_vec();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                if !namespace_exists(&tx, &namespace)? {
                    return Err(namespace_not_open(&namespace));
                }
                for (key, response) in &entries {
                    insert_entry(&tx, &namespace, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn namespace_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM namespaces WHERE name = ?1", params![namespace])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE namespace = ?1")?;
                let urls = stmt
                    .query_map(params![namespace], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                urls.iter()
                    .map(|u| {
                        Url::parse(u)
                            .map(|url| RequestKey::for_url(&url))
                            .map_err(|e| Error::CorruptEntry(format!("{u}: {e}")))
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}
