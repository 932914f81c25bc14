//! Intention (task) use-cases.
//!
//! # Invariants
//! - `id`, `userId`, `createdAt`, `updatedAt` are assigned here, never taken
//!   from callers.
//! - Date queries order by `scheduledTime` ascending; intentions without a
//!   time come first, ties fall back to id order.
//! - Incomplete queries order by `createdAt` descending.

use super::{decode, decode_all, paths, to_object, StoreContext};
use crate::model::intention::{Intention, IntentionPatch, NewIntention};
use crate::store::{Direction, DocumentQuery, DocumentStore, StoreResult, Subscription};
use log::{debug, warn};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct IntentionService<S> {
    ctx: Arc<StoreContext<S>>,
}

impl<S: DocumentStore> IntentionService<S> {
    pub(crate) fn new(ctx: Arc<StoreContext<S>>) -> Self {
        Self { ctx }
    }

    /// Writes a complete new intention and returns its generated id.
    pub fn create_intention(&self, user_id: &str, fields: &NewIntention) -> StoreResult<String> {
        self.ctx.authorize(user_id)?;
        fields.validate()?;

        let collection = paths::intentions(user_id)?;
        let id = self.ctx.store.new_document_id();
        let path = collection.doc(&id)?;
        let now = self.ctx.store.server_time_ms();

        let mut body = to_object(fields)?;
        body.insert("id".to_string(), json!(id));
        body.insert("userId".to_string(), json!(user_id));
        body.insert("createdAt".to_string(), json!(now));
        body.insert("updatedAt".to_string(), json!(now));
        self.ctx.store.set(&path, Value::Object(body))?;

        debug!("event=intention_create module=service status=ok");
        Ok(id)
    }

    /// Field-by-field update that refreshes `updatedAt`.
    pub fn update_intention(
        &self,
        user_id: &str,
        intention_id: &str,
        patch: &IntentionPatch,
    ) -> StoreResult<()> {
        self.ctx.authorize(user_id)?;
        patch.validate()?;
        let mut fields = to_object(patch)?;
        fields.insert(
            "updatedAt".to_string(),
            json!(self.ctx.store.server_time_ms()),
        );
        self.ctx.store.update(
            &paths::intentions(user_id)?.doc(intention_id)?,
            Value::Object(fields),
        )
    }

    /// Marks an intention done (stamping `completedAt`) or reopens it.
    pub fn complete_intention(
        &self,
        user_id: &str,
        intention_id: &str,
        completed: bool,
    ) -> StoreResult<()> {
        let completed_at = completed.then(|| self.ctx.store.server_time_ms());
        let patch = IntentionPatch {
            completed: Some(completed),
            completed_at: Some(completed_at),
            ..IntentionPatch::default()
        };
        self.update_intention(user_id, intention_id, &patch)
    }

    /// Hard delete without tombstone.
    pub fn delete_intention(&self, user_id: &str, intention_id: &str) -> StoreResult<()> {
        self.ctx.authorize(user_id)?;
        self.ctx
            .store
            .delete(&paths::intentions(user_id)?.doc(intention_id)?)
    }

    pub fn get_intention(
        &self,
        user_id: &str,
        intention_id: &str,
    ) -> StoreResult<Option<Intention>> {
        self.ctx.authorize(user_id)?;
        self.ctx
            .store
            .get(&paths::intentions(user_id)?.doc(intention_id)?)?
            .map(decode)
            .transpose()
    }

    pub fn get_intentions_for_date(
        &self,
        user_id: &str,
        date: &str,
    ) -> StoreResult<Vec<Intention>> {
        self.ctx.authorize(user_id)?;
        let query = for_date_query(user_id, date)?;
        decode_all(self.ctx.store.query(&query)?)
    }

    pub fn get_incomplete_intentions(&self, user_id: &str) -> StoreResult<Vec<Intention>> {
        self.ctx.authorize(user_id)?;
        let query = DocumentQuery::new(paths::intentions(user_id)?)
            .where_eq("completed", false)
            .order_by("createdAt", Direction::Descending);
        decode_all(self.ctx.store.query(&query)?)
    }

    /// Live equivalent of `get_intentions_for_date` for today's date, taken at
    /// subscription time. Every delivery is the full result set.
    pub fn subscribe_today_intentions(
        &self,
        user_id: &str,
        callback: impl Fn(Vec<Intention>) + Send + Sync + 'static,
    ) -> StoreResult<Subscription> {
        self.ctx.authorize(user_id)?;
        let query = for_date_query(user_id, &self.ctx.today())?;
        self.ctx.store.watch_query(
            &query,
            Box::new(move |values| match decode_all::<Intention>(values) {
                Ok(intentions) => callback(intentions),
                Err(err) => warn!(
                    "event=intentions_watch module=service status=error error_code=decode_failed error={err}"
                ),
            }),
        )
    }
}

fn for_date_query(user_id: &str, date: &str) -> StoreResult<DocumentQuery> {
    Ok(DocumentQuery::new(paths::intentions(user_id)?)
        .where_eq("scheduledDate", date)
        .order_by("scheduledTime", Direction::Ascending))
}
