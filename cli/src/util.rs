use std::io::{BufRead, Write};

use pitchside_core::backend::BackendError;
use pitchside_core::field::FieldValues;
use pitchside_core::session::SessionError;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Stored credentials for the CLI
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub api_url: String,
    pub api_key: String,
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string()));
    std::process::exit(4);
}

pub fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{out}");
            0
        }
        Err(e) => {
            eprintln!("{}", json!({"error": "cli_error", "message": format!("{e}")}));
            2
        }
    }
}

/// Print a session error as structured JSON and return its exit code.
///
/// Exit codes: 1=client error (4xx) or rejected input, 2=server error (5xx),
///             3=connection error, 4=usage error
pub fn report_session_error(err: &SessionError) -> i32 {
    let (code, output) = match err {
        SessionError::Backend(backend) => return report_backend_error(backend),
        SessionError::Draft(draft) => (
            4,
            json!({
                "error": "cli_error",
                "message": draft.to_string(),
                "docs_hint": "Run `pitchside schema list` to see the available profile types and fields."
            }),
        ),
        SessionError::Optimistic(_) | SessionError::ProfileNotLoaded => (
            1,
            json!({"error": "cli_error", "message": err.to_string()}),
        ),
    };
    eprintln!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string()));
    code
}

pub fn report_backend_error(err: &BackendError) -> i32 {
    let (code, output) = match err {
        BackendError::Network(message) => (
            3,
            json!({
                "error": "connection_error",
                "message": message,
                "docs_hint": "Is the API server running? Check PITCHSIDE_API_URL."
            }),
        ),
        BackendError::Status {
            status,
            body: Some(body),
        } => (
            if *status >= 500 { 2 } else { 1 },
            serde_json::to_value(body).unwrap_or_else(|_| json!({"message": body.message})),
        ),
        BackendError::Status { status, body: None } => (
            if *status >= 500 { 2 } else { 1 },
            json!({"error": "http_error", "message": err.to_string(), "status": status}),
        ),
        BackendError::Decode(_) => {
            (2, json!({"error": "cli_error", "message": err.to_string()}))
        }
    };
    eprintln!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string()));
    code
}

pub fn config_path() -> std::path::PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("pitchside");
    config_dir.join("config.json")
}

pub fn load_credentials() -> Option<StoredCredentials> {
    let path = config_path();
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_credentials(creds: &StoredCredentials) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(creds)?;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)?;
    file.write_all(data.as_bytes())?;

    Ok(())
}

/// Resolve a Bearer token for API requests (priority order):
/// 1. PITCHSIDE_API_KEY env var
/// 2. ~/.config/pitchside/config.json, when it was saved for the same API URL
pub fn resolve_token(api_url: &str) -> Option<String> {
    if let Ok(key) = std::env::var("PITCHSIDE_API_KEY")
        && !key.trim().is_empty()
    {
        return Some(key);
    }
    load_credentials()
        .filter(|creds| creds.api_url == api_url)
        .map(|creds| creds.api_key)
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}

/// Parse field values from `--values` or `--values-file`. Absent both, the
/// draft starts empty.
pub fn parse_values(values: Option<&str>, values_file: Option<&str>) -> FieldValues {
    let raw = match (values, values_file) {
        (Some(raw), _) => serde_json::from_str(raw).unwrap_or_else(|e| {
            exit_error(
                &format!("Invalid JSON in --values: {e}"),
                Some("Provide a JSON object, e.g. --values '{\"full_name\":\"Jane\"}'"),
            )
        }),
        (None, Some(path)) => read_json_from_file(path).unwrap_or_else(|e| {
            exit_error(
                &e,
                Some("Provide a valid JSON file for --values-file (or '-' for stdin)"),
            )
        }),
        (None, None) => return FieldValues::new(),
    };
    serde_json::from_value(raw).unwrap_or_else(|e| {
        exit_error(
            &format!("Field values must be a flat JSON object: {e}"),
            Some("Values may be strings, numbers or booleans."),
        )
    })
}

/// Print `label` to stderr and read one trimmed line from stdin.
pub fn prompt(label: &str) -> Result<String, std::io::Error> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{label}: ")?;
    stderr.flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        ));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn confirm(question: &str) -> bool {
    prompt(&format!("{question} [y/N]"))
        .map(|answer| matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false)
}

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
