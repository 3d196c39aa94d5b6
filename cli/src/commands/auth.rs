use pitchside_core::backend::ProfileBackend;
use serde_json::json;

use crate::backend::HttpBackend;
use crate::util::{
    StoredCredentials, config_path, exit_error, print_json, prompt, report_backend_error,
    save_credentials,
};

/// Verify an API key against `/v1/me/profile` and store it for later runs.
pub async fn login(api_url: &str, api_key: Option<String>) -> i32 {
    let api_key = match api_key {
        Some(key) => key,
        None => prompt("API key").unwrap_or_else(|e| {
            exit_error(&format!("Failed to read API key: {e}"), Some("Pass --api-key instead."))
        }),
    };
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        exit_error("API key is empty", Some("Pass --api-key or set PITCHSIDE_API_KEY."));
    }

    let backend = HttpBackend::new(api_url, Some(api_key.clone()));
    let user = match backend.fetch_user_profile().await {
        Ok(user) => user,
        Err(e) => return report_backend_error(&e),
    };

    let creds = StoredCredentials {
        api_url: api_url.to_string(),
        api_key,
    };
    if let Err(e) = save_credentials(&creds) {
        exit_error(&format!("Failed to save credentials: {e}"), None);
    }
    tracing::info!(username = %user.username, "credentials stored");

    print_json(&json!({
        "status": "authenticated",
        "username": user.username,
        "config_path": config_path().to_string_lossy()
    }))
}

pub fn logout() -> i32 {
    let path = config_path();
    if path.exists()
        && let Err(e) = std::fs::remove_file(&path)
    {
        exit_error(&format!("Failed to remove {}: {e}", path.display()), None);
    }
    print_json(&json!({
        "status": "logged_out",
        "config_path": path.to_string_lossy()
    }))
}
