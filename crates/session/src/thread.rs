//! Thread id resolution.

/// Pick the thread for a request: the explicit id, else a stable per-user
/// thread, else a fresh one. Blank values count as absent.
pub fn resolve_thread_id(thread_id: Option<&str>, user_id: Option<&str>) -> String {
    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(id) = present(thread_id) {
        return id.to_string();
    }

    if let Some(user) = present(user_id) {
        return format!("user_{}_session", user);
    }

    uuid::Uuid::new_v4().to_string()
}
