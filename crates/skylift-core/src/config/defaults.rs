//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "skylift.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "skylift.yaml";

/// Env file read when none is given explicitly
pub const DEFAULT_ENV_FILE: &str = ".env.submit";

/// Chrome Web Store API version used when none is configured
pub const DEFAULT_CHROME_API_VERSION: &str = "2";

/// Edge Add-ons API version used when none is configured
pub const DEFAULT_EDGE_API_VERSION: &str = "1.0";

/// Environment variable enabling dry runs
pub const DRY_RUN_ENV: &str = "DRY_RUN";

/// Environment variable overriding the poll interval, in seconds
pub const POLL_INTERVAL_ENV: &str = "SUBMIT_POLL_INTERVAL_SECS";

/// Environment variable overriding the poll timeout, in seconds
pub const POLL_TIMEOUT_ENV: &str = "SUBMIT_POLL_TIMEOUT_SECS";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".skylift.toml",
        ".skylift.yaml",
    ]
}

/// A value asked for by `skylift init`
#[derive(Debug, Clone, Copy)]
pub struct InitField {
    /// Env variable written to the env file
    pub key: &'static str,
    /// Prompt shown to the user
    pub prompt: &'static str,
    /// Hide input while typing
    pub secret: bool,
    /// Value suggested when the user just presses enter
    pub default: Option<&'static str>,
}

const fn field(key: &'static str, prompt: &'static str) -> InitField {
    InitField {
        key,
        prompt,
        secret: false,
        default: None,
    }
}

const fn secret(key: &'static str, prompt: &'static str) -> InitField {
    InitField {
        key,
        prompt,
        secret: true,
        default: None,
    }
}

/// Chrome Web Store values collected by `skylift init`
pub const CHROME_INIT_FIELDS: &[InitField] = &[
    field("CHROME_ZIP", "Chrome ZIP path"),
    field("CHROME_EXTENSION_ID", "Extension ID"),
    field("CHROME_PUBLISHER_ID", "Publisher ID"),
    field("CHROME_CLIENT_ID", "OAuth client ID"),
    secret("CHROME_CLIENT_SECRET", "OAuth client secret"),
    secret("CHROME_REFRESH_TOKEN", "Refresh token"),
];

/// Firefox Add-ons values collected by `skylift init`
pub const FIREFOX_INIT_FIELDS: &[InitField] = &[
    field("FIREFOX_ZIP", "Firefox ZIP path"),
    field("FIREFOX_SOURCES_ZIP", "Sources ZIP path (optional)"),
    field("FIREFOX_EXTENSION_ID", "Extension ID"),
    field("FIREFOX_JWT_ISSUER", "JWT issuer (API key)"),
    secret("FIREFOX_JWT_SECRET", "JWT secret"),
    InitField {
        key: "FIREFOX_CHANNEL",
        prompt: "Channel (listed or unlisted)",
        secret: false,
        default: Some("listed"),
    },
];

/// Edge Add-ons values collected by `skylift init` for both API versions
pub const EDGE_INIT_FIELDS: &[InitField] = &[
    field("EDGE_ZIP", "Edge ZIP path"),
    field("EDGE_PRODUCT_ID", "Product ID"),
    field("EDGE_CLIENT_ID", "Client ID"),
];

/// Edge API versions offered by `skylift init`, newest first
pub const EDGE_API_VERSIONS: &[&str] = &["1.1", "1.0"];

/// Edge API 1.0 client credentials
pub const EDGE_V1_0_FIELDS: &[InitField] = &[
    secret("EDGE_CLIENT_SECRET", "Client secret"),
    field("EDGE_ACCESS_TOKEN_URL", "Access token URL"),
];

/// Edge API 1.1 key
pub const EDGE_V1_1_FIELDS: &[InitField] = &[secret("EDGE_API_KEY", "API key")];

/// Credentials to ask for with the given Edge API version
pub fn edge_auth_fields(api_version: &str) -> &'static [InitField] {
    if api_version == "1.0" {
        EDGE_V1_0_FIELDS
    } else {
        EDGE_V1_1_FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_searched_first() {
        assert_eq!(config_file_names()[0], "skylift.toml");
    }

    #[test]
    fn test_edge_auth_fields_match_version() {
        assert_eq!(edge_auth_fields("1.0")[0].key, "EDGE_CLIENT_SECRET");
        assert_eq!(edge_auth_fields("1.1")[0].key, "EDGE_API_KEY");
        assert!(EDGE_API_VERSIONS.contains(&DEFAULT_EDGE_API_VERSION));
    }

    #[test]
    fn test_init_fields_start_with_zip() {
        for fields in [CHROME_INIT_FIELDS, FIREFOX_INIT_FIELDS, EDGE_INIT_FIELDS] {
            assert!(fields[0].key.ends_with("_ZIP"));
        }
    }
}
