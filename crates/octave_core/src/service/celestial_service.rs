//! Celestial signature documents and the daily transit cache.
//!
//! # Invariants
//! - Roles and focus windows are replaced as whole arrays, never merged.
//! - Absent array documents read as empty sequences; absent singletons as
//!   `None`.
//! - A cached transit payload whose `date` is not today reads as `None`.

use super::{decode, paths, to_object, StoreContext};
use crate::model::celestial::{
    BirthData, DailyTransitCache, DailyTransits, NatalChart, SovereignWindow, UserRole,
};
use crate::store::{DocumentStore, StoreResult};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RolesDocument {
    #[serde(default)]
    roles: Vec<UserRole>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FocusWindowsDocument {
    #[serde(default)]
    windows: Vec<SovereignWindow>,
}

pub struct CelestialService<S> {
    ctx: Arc<StoreContext<S>>,
}

impl<S: DocumentStore> CelestialService<S> {
    pub(crate) fn new(ctx: Arc<StoreContext<S>>) -> Self {
        Self { ctx }
    }

    /// Whole-document write of the birth data.
    pub fn save_birth_data(&self, user_id: &str, birth_data: &BirthData) -> StoreResult<()> {
        birth_data.validate()?;
        self.write_stamped(
            user_id,
            paths::BIRTH_DATA,
            to_object(birth_data)?,
            "updatedAt",
        )
    }

    pub fn get_birth_data(&self, user_id: &str) -> StoreResult<Option<BirthData>> {
        self.read_singleton(user_id, paths::BIRTH_DATA)
    }

    /// Replaces the full role list.
    pub fn replace_roles(&self, user_id: &str, roles: &[UserRole]) -> StoreResult<()> {
        let body = to_object(&RolesDocument {
            roles: roles.to_vec(),
        })?;
        self.write_stamped(user_id, paths::ROLES, body, "updatedAt")
    }

    pub fn get_roles(&self, user_id: &str) -> StoreResult<Vec<UserRole>> {
        let document: Option<RolesDocument> = self.read_singleton(user_id, paths::ROLES)?;
        Ok(document.unwrap_or_default().roles)
    }

    /// Replaces the full focus window list.
    pub fn replace_focus_windows(
        &self,
        user_id: &str,
        windows: &[SovereignWindow],
    ) -> StoreResult<()> {
        for window in windows {
            window.validate()?;
        }
        let body = to_object(&FocusWindowsDocument {
            windows: windows.to_vec(),
        })?;
        self.write_stamped(user_id, paths::FOCUS_WINDOWS, body, "updatedAt")
    }

    pub fn get_focus_windows(&self, user_id: &str) -> StoreResult<Vec<SovereignWindow>> {
        let document: Option<FocusWindowsDocument> =
            self.read_singleton(user_id, paths::FOCUS_WINDOWS)?;
        Ok(document.unwrap_or_default().windows)
    }

    /// Stores a freshly computed chart; `calculatedAt` is store-assigned.
    pub fn save_natal_chart(&self, user_id: &str, chart: &NatalChart) -> StoreResult<()> {
        chart.birth_data.validate()?;
        self.write_stamped(user_id, paths::NATAL_CHART, to_object(chart)?, "calculatedAt")
    }

    pub fn get_natal_chart(&self, user_id: &str) -> StoreResult<Option<NatalChart>> {
        self.read_singleton(user_id, paths::NATAL_CHART)
    }

    /// Overwrites the single transit cache slot.
    pub fn cache_daily_transits(&self, user_id: &str, transits: DailyTransits) -> StoreResult<()> {
        self.ctx.authorize(user_id)?;
        transits.validate()?;
        let cache = transits.into_cache(self.ctx.store.server_time_ms());
        self.ctx.store.set(
            &paths::transit_cache_doc(user_id)?,
            Value::Object(to_object(&cache)?),
        )
    }

    /// Today's cached transits, or `None` when absent or computed for another
    /// day.
    pub fn get_cached_transits(&self, user_id: &str) -> StoreResult<Option<DailyTransitCache>> {
        self.ctx.authorize(user_id)?;
        let Some(value) = self.ctx.store.get(&paths::transit_cache_doc(user_id)?)? else {
            return Ok(None);
        };

        let today = self.ctx.today();
        if value.get("date").and_then(Value::as_str) != Some(today.as_str()) {
            debug!("event=transit_cache_read module=service status=stale");
            return Ok(None);
        }
        let cache: DailyTransitCache = decode(value)?;
        Ok(Some(cache))
    }

    fn write_stamped(
        &self,
        user_id: &str,
        name: &str,
        mut body: serde_json::Map<String, Value>,
        stamp_field: &str,
    ) -> StoreResult<()> {
        self.ctx.authorize(user_id)?;
        body.insert(
            stamp_field.to_string(),
            json!(self.ctx.store.server_time_ms()),
        );
        self.ctx
            .store
            .set(&paths::celestial_doc(user_id, name)?, Value::Object(body))
    }

    fn read_singleton<T: serde::de::DeserializeOwned>(
        &self,
        user_id: &str,
        name: &str,
    ) -> StoreResult<Option<T>> {
        self.ctx.authorize(user_id)?;
        self.ctx
            .store
            .get(&paths::celestial_doc(user_id, name)?)?
            .map(decode)
            .transpose()
    }
}
