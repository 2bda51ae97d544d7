//! Access-token lookup for the platform session.
//!
//! Tokens are issued by an external authorization flow; this module only
//! finds an existing one.

use keyring::Entry;

const ACCESS_TOKEN_ENV: &str = "GENRELIST_ACCESS_TOKEN";
const KEYRING_SERVICE_NAME: &str = "genrelist.spotify";
const KEYRING_ACCOUNT: &str = "access_token";

fn keyring_error_hint(error: &str) -> Option<String> {
    if error.contains("org.freedesktop.DBus.Error.ServiceUnknown") {
        return Some(
            "no Secret Service provider is available. Start GNOME Keyring or KeePassXC Secret Service, or set GENRELIST_ACCESS_TOKEN."
                .to_string(),
        );
    }
    None
}

fn format_keyring_error(operation: &str, error: &str) -> String {
    let base = format!("{operation} failed in system keyring: {error}");
    match keyring_error_hint(error) {
        Some(hint) => format!("{base}. Hint: {hint}"),
        None => base,
    }
}

fn clean_token(value: Option<String>) -> Option<String> {
    value
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Loads the access token stored in the OS keyring, if any.
pub fn get_keyring_access_token() -> Result<Option<String>, String> {
    let entry = Entry::new(KEYRING_SERVICE_NAME, KEYRING_ACCOUNT)
        .map_err(|err| format!("failed to create keyring entry: {err}"))?;
    match entry.get_password() {
        Ok(token) => Ok(clean_token(Some(token))),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(format_keyring_error(
            "load access token",
            &format!("failed to get keyring password: {err}"),
        )),
    }
}

/// Returns the access token from `GENRELIST_ACCESS_TOKEN`, else the keyring.
pub fn resolve_access_token() -> Result<String, String> {
    if let Some(token) = clean_token(std::env::var(ACCESS_TOKEN_ENV).ok()) {
        return Ok(token);
    }
    get_keyring_access_token()?.ok_or_else(|| {
        format!(
            "no access token found; set {ACCESS_TOKEN_ENV} or store one in the keyring under service '{KEYRING_SERVICE_NAME}'"
        )
    })
}
