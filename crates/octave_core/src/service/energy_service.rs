//! Energy check-in use-cases.

use super::{decode, paths, to_object, StoreContext};
use crate::model::energy::{EnergyLog, NewEnergyLog};
use crate::store::{Direction, DocumentQuery, DocumentStore, StoreResult};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct EnergyService<S> {
    ctx: Arc<StoreContext<S>>,
}

impl<S: DocumentStore> EnergyService<S> {
    pub(crate) fn new(ctx: Arc<StoreContext<S>>) -> Self {
        Self { ctx }
    }

    /// Appends one check-in; same-day duplicates are allowed.
    pub fn log_energy(&self, user_id: &str, fields: &NewEnergyLog) -> StoreResult<String> {
        self.ctx.authorize(user_id)?;
        fields.validate()?;

        let collection = paths::energy_logs(user_id)?;
        let id = self.ctx.store.new_document_id();
        let mut body = to_object(fields)?;
        body.insert("id".to_string(), json!(id));
        body.insert(
            "timestamp".to_string(),
            json!(self.ctx.store.server_time_ms()),
        );
        self.ctx.store.set(&collection.doc(&id)?, Value::Object(body))?;
        Ok(id)
    }

    /// Most recently timestamped check-in dated today.
    ///
    /// Check-ins sharing the newest timestamp resolve to the lowest document
    /// id. Ids are random, so that pick is stable but not insertion order.
    pub fn get_today_energy(&self, user_id: &str) -> StoreResult<Option<EnergyLog>> {
        self.ctx.authorize(user_id)?;
        let query = DocumentQuery::new(paths::energy_logs(user_id)?)
            .where_eq("date", self.ctx.today())
            .order_by("timestamp", Direction::Descending);
        self.ctx
            .store
            .query(&query)?
            .into_iter()
            .next()
            .map(decode)
            .transpose()
    }
}
