pub mod account_service;
pub mod booking_service;
pub mod dashboard_service;
pub mod directory_service;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::models::AppState;
    use crate::store::MemoryStore;

    pub fn state_with_memory_store() -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            jwt_secret: "test-secret".into(),
            session_ttl_hours: 24 * 7,
            cookie_secure: false,
            allow_admin_signup: false,
        }
    }
}
