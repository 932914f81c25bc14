//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist JSON documents keyed by full path in the `documents` table.
//! - Evaluate equality/order queries with SQLite JSON functions.
//! - Fan committed writes out to live document and query watches.
//!
//! # Invariants
//! - Watch callbacks run after the write committed and outside every lock.
//! - A watch is only notified when its delivered value actually changed.
//! - Deliveries run in the order they were computed. A write issued from a
//!   callback only queues its deliveries; the drain already in progress runs
//!   them after the ones queued before.
//! - Lock order is watches, then connection, then the delivery queue.

use super::document_store::{DocumentCallback, DocumentStore, QueryCallback};
use super::path::{CollectionPath, DocumentPath};
use super::query::{Direction, DocumentQuery};
use super::subscription::{attach, lock, Listener, ListenerSet, Subscription};
use super::{StoreError, StoreResult};
use crate::clock::Clock;
use crate::db::{open_db, open_db_in_memory};
use crate::model::EpochMs;
use log::{debug, warn};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

enum Watch {
    Document {
        path: DocumentPath,
        last: Option<Value>,
        listener: Listener<Option<Value>>,
    },
    Query {
        query: DocumentQuery,
        last: Vec<Value>,
        listener: Listener<Vec<Value>>,
    },
}

enum Delivery {
    Document(Listener<Option<Value>>, Option<Value>),
    Query(Listener<Vec<Value>>, Vec<Value>),
}

impl Delivery {
    fn run(self) {
        match self {
            Self::Document(listener, value) => listener.deliver(value),
            Self::Query(listener, values) => listener.deliver(values),
        }
    }
}

impl Watch {
    fn collection_name(&self) -> String {
        match self {
            Self::Document { path, .. } => path.parent().name().to_string(),
            Self::Query { query, .. } => query.collection.name().to_string(),
        }
    }

    fn is_affected_by(&self, changed: &DocumentPath, collection: &CollectionPath) -> bool {
        match self {
            Self::Document { path, .. } => path == changed,
            Self::Query { query, .. } => &query.collection == collection,
        }
    }

    /// Recomputes the watched value; returns a delivery only when it changed.
    fn refresh(&mut self, conn: &Connection) -> StoreResult<Option<Delivery>> {
        match self {
            Self::Document {
                path,
                last,
                listener,
            } => {
                let current = read_document(conn, path)?;
                if current == *last {
                    return Ok(None);
                }
                *last = current.clone();
                Ok(Some(Delivery::Document(listener.clone(), current)))
            }
            Self::Query {
                query,
                last,
                listener,
            } => {
                let current = run_query(conn, query)?;
                if current == *last {
                    return Ok(None);
                }
                *last = current.clone();
                Ok(Some(Delivery::Query(listener.clone(), current)))
            }
        }
    }
}

/// FIFO of computed deliveries plus the flag of the thread draining it.
#[derive(Default)]
struct DeliveryQueue {
    pending: VecDeque<Delivery>,
    draining: bool,
}

/// Releases the draining flag if a callback panics mid-drain.
struct DrainGuard<'a>(&'a Mutex<DeliveryQueue>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        lock(self.0).draining = false;
    }
}

/// Document store over one SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    watches: Arc<Mutex<ListenerSet<Watch>>>,
    deliveries: Mutex<DeliveryQueue>,
}

impl SqliteDocumentStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, clock: Arc<dyn Clock>) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock,
            watches: Arc::default(),
            deliveries: Mutex::default(),
        }
    }

    /// Opens (and migrates) a file-backed store.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?, clock))
    }

    /// Opens an empty in-memory store.
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?, clock))
    }

    /// Number of live watches.
    pub fn watch_count(&self) -> usize {
        lock(&self.watches).len()
    }

    fn publish(&self, changed: &DocumentPath) {
        let collection = changed.parent();
        {
            let mut watches = lock(&self.watches);
            let conn = lock(&self.conn);
            let affected: Vec<u64> = watches
                .iter()
                .filter(|(_, watch)| watch.is_affected_by(changed, &collection))
                .map(|(id, _)| id)
                .collect();

            let mut computed = Vec::with_capacity(affected.len());
            for id in affected {
                let Some(watch) = watches.get_mut(id) else {
                    continue;
                };
                match watch.refresh(&conn) {
                    Ok(Some(delivery)) => computed.push(delivery),
                    Ok(None) => {}
                    Err(err) => warn!(
                        "event=watch_refresh module=store status=error watch_id={id} collection={} error={err}",
                        collection.name()
                    ),
                }
            }
            // Queued before the watches lock is released so queue order is
            // refresh order.
            lock(&self.deliveries).pending.extend(computed);
        }
        self.drain_deliveries();
    }

    /// Runs queued deliveries unless another call is already draining; that
    /// drain picks up everything queued here, possibly on another thread.
    fn drain_deliveries(&self) {
        {
            let mut queue = lock(&self.deliveries);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }
        let guard = DrainGuard(&self.deliveries);
        loop {
            let next = {
                let mut queue = lock(&self.deliveries);
                match queue.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        queue.draining = false;
                        break;
                    }
                }
            };
            next.run();
        }
        std::mem::forget(guard);
    }

    /// Registers `watch` and queues its initial delivery atomically with
    /// respect to concurrent writes.
    fn open_watch(
        &self,
        kind: &'static str,
        active: Arc<AtomicBool>,
        build: impl FnOnce(&Connection) -> StoreResult<(Watch, Delivery)>,
    ) -> StoreResult<Subscription> {
        let subscription = {
            let mut watches = lock(&self.watches);
            let (watch, initial) = {
                let conn = lock(&self.conn);
                build(&conn)?
            };
            let collection = watch.collection_name();
            let id = watches.insert(watch);
            lock(&self.deliveries).pending.push_back(initial);
            debug!(
                "event=watch_open module=store kind={kind} watch_id={id} collection={collection}"
            );
            attach(&self.watches, id, active)
        };
        self.drain_deliveries();
        Ok(subscription)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn server_time_ms(&self) -> EpochMs {
        self.clock.now_ms()
    }

    fn new_document_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn get(&self, path: &DocumentPath) -> StoreResult<Option<Value>> {
        let conn = lock(&self.conn);
        read_document(&conn, path)
    }

    fn set(&self, path: &DocumentPath, body: Value) -> StoreResult<()> {
        let body = into_object(body)?;
        let now = self.server_time_ms();
        let text = serde_json::to_string(&body)?;
        {
            let conn = lock(&self.conn);
            conn.execute(
                "INSERT INTO documents (path, collection, doc_id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(path) DO UPDATE SET
                    body = excluded.body,
                    updated_at = excluded.updated_at;",
                params![
                    path.as_str(),
                    path.parent().as_str(),
                    path.id(),
                    text,
                    now
                ],
            )?;
        }
        debug!(
            "event=doc_write module=store op=set status=ok collection={}",
            path.parent().name()
        );
        self.publish(path);
        Ok(())
    }

    fn update(&self, path: &DocumentPath, fields: Value) -> StoreResult<()> {
        let fields = into_object(fields)?;
        let now = self.server_time_ms();
        {
            let mut conn = lock(&self.conn);
            let tx = conn.transaction()?;
            let mut merged = match read_document(&tx, path)? {
                Some(Value::Object(existing)) => existing,
                Some(_) => {
                    return Err(StoreError::InvalidData(format!(
                        "document `{path}` is not an object"
                    )))
                }
                None => return Err(StoreError::NotFound(path.to_string())),
            };
            for (key, value) in fields {
                merged.insert(key, value);
            }
            tx.execute(
                "UPDATE documents SET body = ?2, updated_at = ?3 WHERE path = ?1;",
                params![path.as_str(), serde_json::to_string(&merged)?, now],
            )?;
            tx.commit()?;
        }
        debug!(
            "event=doc_write module=store op=update status=ok collection={}",
            path.parent().name()
        );
        self.publish(path);
        Ok(())
    }

    fn delete(&self, path: &DocumentPath) -> StoreResult<()> {
        let changed = {
            let conn = lock(&self.conn);
            conn.execute("DELETE FROM documents WHERE path = ?1;", [path.as_str()])?
        };
        debug!(
            "event=doc_write module=store op=delete status=ok collection={} changed={changed}",
            path.parent().name()
        );
        if changed > 0 {
            self.publish(path);
        }
        Ok(())
    }

    fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Value>> {
        let conn = lock(&self.conn);
        run_query(&conn, query)
    }

    fn watch_document(
        &self,
        path: &DocumentPath,
        callback: DocumentCallback,
    ) -> StoreResult<Subscription> {
        let listener = Listener::new(callback);
        self.open_watch("document", listener.active_flag(), |conn| {
            let initial = read_document(conn, path)?;
            Ok((
                Watch::Document {
                    path: path.clone(),
                    last: initial.clone(),
                    listener: listener.clone(),
                },
                Delivery::Document(listener, initial),
            ))
        })
    }

    fn watch_query(
        &self,
        query: &DocumentQuery,
        callback: QueryCallback,
    ) -> StoreResult<Subscription> {
        let listener = Listener::new(callback);
        self.open_watch("query", listener.active_flag(), |conn| {
            let initial = run_query(conn, query)?;
            Ok((
                Watch::Query {
                    query: query.clone(),
                    last: initial.clone(),
                    listener: listener.clone(),
                },
                Delivery::Query(listener, initial),
            ))
        })
    }
}

fn read_document(conn: &Connection, path: &DocumentPath) -> StoreResult<Option<Value>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE path = ?1;",
            [path.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

fn run_query(conn: &Connection, query: &DocumentQuery) -> StoreResult<Vec<Value>> {
    query.validate()?;

    let mut sql = String::from("SELECT body FROM documents WHERE collection = ?");
    let mut bind_values = vec![SqlValue::Text(query.collection.as_str().to_string())];

    for filter in &query.filters {
        bind_values.push(SqlValue::Text(format!("$.{}", filter.field)));
        match json_to_sql(&filter.value)? {
            Some(value) => {
                sql.push_str(" AND json_extract(body, ?) = ?");
                bind_values.push(value);
            }
            None => sql.push_str(" AND json_extract(body, ?) IS NULL"),
        }
    }

    if let Some(order) = query.order_by.as_ref() {
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        sql.push_str(&format!(" ORDER BY json_extract(body, ?) {direction}, doc_id ASC"));
        bind_values.push(SqlValue::Text(format!("$.{}", order.field)));
    } else {
        sql.push_str(" ORDER BY doc_id ASC");
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut documents = Vec::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        documents.push(serde_json::from_str(&text)?);
    }
    Ok(documents)
}

fn json_to_sql(value: &Value) -> StoreResult<Option<SqlValue>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(SqlValue::Integer(i64::from(*flag)))),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => Ok(Some(SqlValue::Integer(integer))),
            None => number.as_f64().map(SqlValue::Real).map(Some).ok_or_else(|| {
                StoreError::InvalidData(format!("unsupported numeric filter value {number}"))
            }),
        },
        Value::String(text) => Ok(Some(SqlValue::Text(text.clone()))),
        Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidData(
            "filters only compare scalar values".to_string(),
        )),
    }
}

fn into_object(value: Value) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidData(format!(
            "document body must be an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
