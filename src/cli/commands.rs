//! CLI command implementations
//!
//! Boot sequence for `start` and `exec`:
//! 1. Load and validate configuration
//! 2. Refuse to run against an uninitialized data directory
//! 3. Open the record store (checksum verified)
//! 4. Build the request handler
//!
//! Any failure before serving ends the process.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{ApiHandler, RecordService, Response};
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::record::{
    RecordValidator, DEFAULT_EMAIL_DOMAINS, DEFAULT_EMERGENCY_AGE_THRESHOLD,
};
use crate::store::{JsonFileStore, RecordStore};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_json};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Store file name inside `data_dir`
    #[serde(default = "default_store_file")]
    pub store_file: String,

    /// Domains accepted for the optional email field
    #[serde(default = "default_email_domains")]
    pub allowed_email_domains: Vec<String>,

    /// Patients older than this must list an emergency contact
    #[serde(default = "default_emergency_age_threshold")]
    pub emergency_age_threshold: i64,
}

fn default_store_file() -> String {
    "patients.json".to_string()
}
fn default_email_domains() -> Vec<String> {
    DEFAULT_EMAIL_DOMAINS.iter().map(|d| d.to_string()).collect()
}
fn default_emergency_age_threshold() -> i64 {
    DEFAULT_EMERGENCY_AGE_THRESHOLD
}

impl Config {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.store_file.is_empty() || self.store_file.contains(['/', '\\']) {
            return Err(CliError::config_error(format!(
                "Invalid store_file: '{}'. Must be a plain file name.",
                self.store_file
            )));
        }

        if self.allowed_email_domains.is_empty() {
            return Err(CliError::config_error(
                "allowed_email_domains must not be empty",
            ));
        }
        for domain in &self.allowed_email_domains {
            if domain.is_empty() || domain.contains('@') || *domain != domain.to_lowercase() {
                return Err(CliError::config_error(format!(
                    "Invalid email domain: '{}'. Must be a lower-case domain name.",
                    domain
                )));
            }
        }

        if !(0..120).contains(&self.emergency_age_threshold) {
            return Err(CliError::config_error(format!(
                "emergency_age_threshold must be in 0..120, got {}",
                self.emergency_age_threshold
            )));
        }

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_path().join(&self.store_file)
    }

    /// Record validator configured from this file.
    pub fn validator(&self) -> RecordValidator {
        RecordValidator::patient(&self.allowed_email_domains, self.emergency_age_threshold)
    }
}

/// Main CLI entry point
///
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Start { config } => start(&config),
        Command::Exec { config } => exec(&config),
    }
}

/// Creates the data directory and an empty store file.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    fs::create_dir_all(config.data_path()).map_err(|e| {
        CliError::config_error(format!(
            "Failed to create directory {:?}: {}",
            config.data_path(),
            e
        ))
    })?;
    JsonFileStore::create(config.store_path())?;

    let response = Response::ok(json!({ "initialized": true }));
    write_json(&mut io::stdout(), &response.to_json())
}

/// Serves stdin line by line until end of input.
pub fn start(config_path: &Path) -> CliResult<()> {
    log_event(Event::BootStart);
    let handler = boot(config_path)?;
    log_event(Event::BootComplete);

    let stdin = io::stdin();
    let served = serve(&handler, &mut stdin.lock(), &mut io::stdout())?;

    let served = served.to_string();
    log_event_with_fields(Event::ShutdownStart, &[("requests", served.as_str())]);
    log_event(Event::ShutdownComplete);
    Ok(())
}

/// Executes one request from stdin and exits.
pub fn exec(config_path: &Path) -> CliResult<()> {
    let handler = boot(config_path)?;

    let stdin = io::stdin();
    let request = read_request(&mut stdin.lock())?
        .ok_or_else(|| CliError::io_error("Empty input"))?;

    let response = handler.handle(&request);
    write_json(&mut io::stdout(), &response.to_json())
}

/// Answers every request line from `input` on `output`.
///
/// Returns the number of requests handled.
pub fn serve<S, R, W>(handler: &ApiHandler<S>, input: &mut R, output: &mut W) -> CliResult<usize>
where
    S: RecordStore,
    R: BufRead,
    W: Write,
{
    let mut served = 0;
    while let Some(line) = read_request(input)? {
        let response = handler.handle(&line);
        write_json(output, &response.to_json())?;
        served += 1;
    }
    Ok(served)
}

fn is_initialized(config: &Config) -> bool {
    config.store_path().exists()
}

/// Loads configuration and opens the store behind a handler.
fn boot(config_path: &Path) -> CliResult<ApiHandler<JsonFileStore>> {
    let config = Config::load(config_path)?;
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_dir", config.data_dir.as_str()),
            ("store_file", config.store_file.as_str()),
        ],
    );

    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let store = match JsonFileStore::open(config.store_path()) {
        Ok(store) => store,
        Err(e) if e.is_fatal() => {
            let detail = e.to_string();
            log_event_with_fields(Event::StoreCorrupted, &[("error", detail.as_str())]);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let records = store.len()?.to_string();
    let path = store.path().display().to_string();
    log_event_with_fields(
        Event::StoreOpened,
        &[
            ("path", path.as_str()),
            ("records", records.as_str()),
        ],
    );

    Ok(ApiHandler::new(RecordService::new(store, config.validator())))
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::Value;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir, extra: Value) -> PathBuf {
        let config_path = temp_dir.path().join("vitalsdb.json");
        let data_dir = temp_dir.path().join("data");

        let mut config = json!({ "data_dir": data_dir.to_string_lossy() });
        if let (Some(map), Some(extra)) = (config.as_object_mut(), extra.as_object()) {
            map.extend(extra.clone());
        }

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&create_config(&temp_dir, json!({}))).unwrap();
        assert_eq!(config.store_file, "patients.json");
        assert_eq!(config.allowed_email_domains, vec!["hdfc.com", "icici.com"]);
        assert_eq!(config.emergency_age_threshold, 60);
        assert_eq!(
            config.store_path(),
            temp_dir.path().join("data").join("patients.json")
        );
    }

    #[test]
    fn test_config_validation() {
        for bad in [
            json!({ "allowed_email_domains": [] }),
            json!({ "allowed_email_domains": ["HDFC.com"] }),
            json!({ "emergency_age_threshold": 120 }),
            json!({ "store_file": "../escape.json" }),
        ] {
            let temp_dir = TempDir::new().unwrap();
            let err = Config::load(&create_config(&temp_dir, bad.clone())).unwrap_err();
            assert_eq!(err.code(), &CliErrorCode::ConfigError, "{}", bad);
        }
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = Config::load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_init_creates_store() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({}));

        init(&config_path).unwrap();
        let store_path = temp_dir.path().join("data").join("patients.json");
        assert!(store_path.exists());
        assert_eq!(JsonFileStore::open(&store_path).unwrap().len().unwrap(), 0);
    }

    #[test]
    fn test_init_refuses_reinit() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({}));

        init(&config_path).unwrap();
        let err = init(&config_path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);
    }

    #[test]
    fn test_start_requires_init() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({}));

        let err = boot(&config_path).err().unwrap();
        assert_eq!(err.code(), &CliErrorCode::NotInitialized);
    }

    #[test]
    fn test_malformed_config_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("vitalsdb.json");
        fs::write(&config_path, "{ data_dir: }").unwrap();

        let err = Config::load(&config_path).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().starts_with("Invalid config JSON"));
    }

    #[test]
    fn test_boot_refuses_damaged_store() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!({}));
        init(&config_path).unwrap();

        let store_path = temp_dir.path().join("data").join("patients.json");
        fs::write(&store_path, r#"{"checksum":1,"records":{}}"#).unwrap();
        let err = boot(&config_path).err().unwrap();
        assert_eq!(err.code(), &CliErrorCode::BootFailed);
        assert!(err.message().contains("VITALS_STORE_CORRUPTED"));

        fs::write(&store_path, "[]").unwrap();
        let err = boot(&config_path).err().unwrap();
        assert!(err.message().contains("VITALS_STORE_MALFORMED"));
    }

    #[test]
    fn test_boot_uses_configured_rules() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(
            &temp_dir,
            json!({ "allowed_email_domains": ["clinic.org"], "emergency_age_threshold": 40 }),
        );
        init(&config_path).unwrap();
        let handler = boot(&config_path).unwrap();

        let resp = handler.handle(
            r#"{"op":"create","id":"P1","record":{"name":"asha","city":"b","age":45,"gender":"male","height":170,"weight":70}}"#,
        );
        assert_eq!(resp.to_value()["violations"][0]["rule"], "emergency_contact_required");

        let resp = handler.handle(
            r#"{"op":"create","id":"P1","record":{"name":"asha","city":"b","age":30,"gender":"male","height":170,"weight":70,"email":"a@clinic.org"}}"#,
        );
        assert!(resp.is_success());
    }

    #[test]
    fn test_serve_answers_each_line() {
        let handler = ApiHandler::new(RecordService::new(
            MemoryStore::new(),
            RecordValidator::default(),
        ));
        let mut input = Cursor::new(
            "{\"op\":\"status\"}\n\n{\"op\":\"get\",\"id\":\"P1\"}\nnot json\n",
        );
        let mut output = Vec::new();

        let served = serve(&handler, &mut input, &mut output).unwrap();
        assert_eq!(served, 3);

        let statuses: Vec<String> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["status"].to_string())
            .collect();
        assert_eq!(
            statuses,
            vec!["\"ok\"", "\"not_found\"", "\"invalid_request\""]
        );
    }
}
