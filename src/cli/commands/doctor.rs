//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Tubegist Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_check = check_tool("yt-dlp", &settings.transcript.ytdlp_path, install_hint_ytdlp());
    tool_check.print();
    checks.push(tool_check);

    println!();

    println!("{}", style("Model").bold());
    let model_checks = vec![
        check_endpoint(settings).await,
        check_api_key(settings),
    ];
    for check in &model_checks {
        check.print();
    }
    checks.extend(model_checks);

    println!();

    println!("{}", style("Directories").bold());
    let dir_check = check_temp_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Tubegist.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Tubegist is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, program: &str, hint: &str) -> CheckResult {
    match Command::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, &format!("{} not found", program), hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check that the model endpoint answers `GET /models` and serves the configured model.
async fn check_endpoint(settings: &Settings) -> CheckResult {
    let endpoint = settings.model.endpoint.trim_end_matches('/');
    let url = format!("{}/models", endpoint);
    let hint = "Start Ollama (ollama serve) or set model.endpoint in the config file";

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => return CheckResult::error("Endpoint", &format!("error: {}", e), hint),
    };

    let response = match client
        .get(&url)
        .bearer_auth(settings.model.resolved_api_key())
        .send()
        .await
    {
        Ok(response) => response,
        Err(_) => return CheckResult::error("Endpoint", &format!("{} unreachable", endpoint), hint),
    };

    if !response.status().is_success() {
        return CheckResult::warning(
            "Endpoint",
            &format!("{} answered {}", endpoint, response.status()),
            "Check that the endpoint is OpenAI-compatible (it should end in /v1)",
        );
    }

    let models = response.json::<Value>().await.unwrap_or(Value::Null);
    if model_listed(&models, &settings.model.name) {
        CheckResult::ok(
            "Endpoint",
            &format!("{} (model {})", endpoint, settings.model.name),
        )
    } else {
        CheckResult::warning(
            "Endpoint",
            &format!("{} reachable, model {} not listed", endpoint, settings.model.name),
            &format!("Pull it with: ollama pull {}", settings.model.name),
        )
    }
}

/// Whether a `/models` listing contains `name`, with or without a `:tag` suffix.
fn model_listed(models: &Value, name: &str) -> bool {
    models
        .get("data")
        .and_then(|d| d.as_array())
        .map(|data| {
            data.iter()
                .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                .any(|id| id == name || id.split(':').next() == Some(name))
        })
        .unwrap_or(false)
}

fn check_api_key(settings: &Settings) -> CheckResult {
    if settings.model.api_key.is_some() {
        return CheckResult::ok("API key", "set in config file");
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => CheckResult::ok("API key", "from OPENAI_API_KEY"),
        _ => CheckResult::ok("API key", "not set (fine for Ollama)"),
    }
}

fn check_temp_dir(settings: &Settings) -> CheckResult {
    let temp_dir = settings.temp_dir();
    if temp_dir.exists() {
        CheckResult::ok("Temp directory", &format!("{}", temp_dir.display()))
    } else {
        CheckResult::warning(
            "Temp directory",
            &format!("{} (will be created)", temp_dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        let size = std::fs::metadata(config_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        CheckResult::ok(
            "Config file",
            &format!("{} ({})", config_path.display(), size),
        )
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubegist config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
