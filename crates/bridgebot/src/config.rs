use once_cell::sync::Lazy;
use std::env;

/// Telegram user ids allowed to issue download commands.
/// Read from ALLOWED_USER_IDS (comma separated). Empty means everyone.
pub static ALLOWED_USER_IDS: Lazy<Vec<u64>> = Lazy::new(|| {
    env::var("ALLOWED_USER_IDS")
        .map(|raw| raw.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default()
});

/// WhatsApp sender JIDs allowed to issue download commands.
/// Read from WA_ALLOWED_SENDERS (comma separated). Empty means everyone.
pub static WA_ALLOWED_SENDERS: Lazy<Vec<String>> = Lazy::new(|| {
    env::var("WA_ALLOWED_SENDERS")
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
});

/// True when BOT_API_URL points at a self-hosted Bot API server.
/// Self-hosted servers raise the upload limit to 2 GB, so videos skip the
/// document fallback regardless of size.
pub static SELF_HOSTED_API: Lazy<bool> = Lazy::new(|| {
    env::var("BOT_API_URL")
        .map(|u| !u.contains("api.telegram.org"))
        .unwrap_or(false)
});

/// WhatsApp gateway base URL (e.g. http://localhost:8066). Unset disables
/// the WhatsApp side entirely.
pub static WA_GATEWAY_URL: Lazy<Option<String>> = Lazy::new(|| env::var("WA_GATEWAY_URL").ok());

/// Bearer token for the WhatsApp gateway.
pub static WA_GATEWAY_TOKEN: Lazy<String> =
    Lazy::new(|| env::var("WA_GATEWAY_TOKEN").unwrap_or_else(|_| String::new()));

#[cfg(test)]
mod tests {
    #[test]
    fn test_allowed_ids_parse_shape() {
        // The statics read the real environment; exercise the parsing logic
        // on a scratch value instead.
        let parsed: Vec<u64> = "123, 456,,abc, 789"
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        assert_eq!(parsed, vec![123, 456, 789]);
    }
}
