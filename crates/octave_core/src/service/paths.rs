//! Persisted layout under a user's root document.
//!
//! ```text
//! users/{uid}                          UserProfile
//! users/{uid}/celestial/birthData      BirthData
//! users/{uid}/celestial/roles          { roles: UserRole[] }
//! users/{uid}/celestial/focusWindows   { windows: SovereignWindow[] }
//! users/{uid}/celestial/natalChart     NatalChart
//! users/{uid}/cache/dailyTransits      DailyTransitCache
//! users/{uid}/intentions/{id}          Intention
//! users/{uid}/energyLogs/{id}          EnergyLog
//! ```

use crate::store::{CollectionPath, DocumentPath, StoreResult};

pub const USERS: &str = "users";
pub const CELESTIAL: &str = "celestial";
pub const CACHE: &str = "cache";
pub const INTENTIONS: &str = "intentions";
pub const ENERGY_LOGS: &str = "energyLogs";

pub const BIRTH_DATA: &str = "birthData";
pub const ROLES: &str = "roles";
pub const FOCUS_WINDOWS: &str = "focusWindows";
pub const NATAL_CHART: &str = "natalChart";
pub const DAILY_TRANSITS: &str = "dailyTransits";

pub fn user_doc(user_id: &str) -> StoreResult<DocumentPath> {
    CollectionPath::root(USERS)?.doc(user_id)
}

pub fn celestial_doc(user_id: &str, name: &str) -> StoreResult<DocumentPath> {
    user_doc(user_id)?.child(CELESTIAL, name)
}

pub fn transit_cache_doc(user_id: &str) -> StoreResult<DocumentPath> {
    user_doc(user_id)?.child(CACHE, DAILY_TRANSITS)
}

pub fn intentions(user_id: &str) -> StoreResult<CollectionPath> {
    user_doc(user_id)?.collection(INTENTIONS)
}

pub fn energy_logs(user_id: &str) -> StoreResult<CollectionPath> {
    user_doc(user_id)?.collection(ENERGY_LOGS)
}
