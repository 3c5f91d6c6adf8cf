//! `--check`: report which settings are present

use std::path::Path;

use taxi_core::Config;

/// Mask a secret, keeping a short prefix and suffix of long values
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 12 {
        return "***masked***".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 12), tail)
}

fn secret_line(name: &str, value: Option<&str>, required: bool) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if v.to_lowercase().starts_with("your") => {
            format!("❌ {} looks like a placeholder: {}", name, mask_secret(v))
        }
        Some(v) => format!("✅ {} found: {}", name, mask_secret(v)),
        None if required => format!("❌ {} not set", name),
        None => format!("⚠️  {} not set (optional)", name),
    }
}

fn plain_line(name: &str, value: &str) -> String {
    format!("✅ {}: {}", name, value)
}

/// Lines of the environment report, in display order
pub fn report(config: &Config) -> Vec<String> {
    let mut lines = vec![
        plain_line("LLM provider", &format!("{:?}", config.llm.provider)),
        plain_line("LLM model", config.llm.model()),
        secret_line("LLM API key", Some(&config.llm.api_key), false),
        secret_line("META_TOKEN", config.whatsapp.access_token.as_deref(), false),
        secret_line(
            "META_PHONE_NUMBER_ID",
            config.whatsapp.phone_number_id.as_deref(),
            false,
        ),
        secret_line(
            "WEBHOOK_VERIFY_TOKEN",
            Some(&config.whatsapp.verify_token),
            config.whatsapp.is_configured(),
        ),
        secret_line("META_APP_SECRET", config.whatsapp.app_secret.as_deref(), false),
        secret_line("API_KEY", config.api.key.as_deref(), false),
        plain_line("API port", &config.api.port.to_string()),
        plain_line("History database", &config.history.db_path),
        plain_line("Support phone", &config.support.phone),
    ];

    if Path::new(&config.faq.data_path).is_file() {
        lines.push(plain_line("FAQ data", &config.faq.data_path));
    } else {
        lines.push(format!("❌ FAQ data not found at {}", config.faq.data_path));
    }

    if !config.llm.is_configured() {
        lines.push("⚠️  No usable LLM key: answers come from the FAQ only (offline mode)".to_string());
    }

    lines
}

pub fn print_report(config: &Config) {
    println!("🔍 Checking configuration");
    println!("{}", "=".repeat(50));
    for line in report(config) {
        println!("{}", line);
    }
    println!("{}", "=".repeat(50));
}
