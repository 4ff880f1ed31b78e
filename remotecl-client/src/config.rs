//! Client configuration and `REMOTECL` environment parsing.

use remotecl_protocol::DEFAULT_PORT;

/// The environment variable the client honours.
pub const ENV_VAR: &str = "REMOTECL";

/// Where the client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Builds the configuration from the `REMOTECL` environment variable,
    /// falling back to compiled defaults for anything unspecified.
    pub fn from_env() -> Self {
        match std::env::var(ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::default(),
        }
    }

    /// Parses a semicolon-separated `key=value` list.
    ///
    /// Recognized keys: `host` (the value may be double-quoted to include
    /// `;`) and `port` (decimal). Unknown keys and unparsable ports are
    /// ignored.
    pub fn parse(spec: &str) -> Self {
        let mut config = Self::default();

        let mut rest = spec;
        while !rest.is_empty() {
            let Some(eq) = rest.find('=') else { break };
            let key = rest[..eq].trim();
            rest = &rest[eq + 1..];

            let value;
            if let Some(stripped) = rest.strip_prefix('"') {
                match stripped.find('"') {
                    Some(close) => {
                        value = &stripped[..close];
                        rest = &stripped[close + 1..];
                    }
                    None => {
                        // Unterminated quote: the token is unusable.
                        break;
                    }
                }
            } else {
                match rest.find(';') {
                    Some(semi) => {
                        value = &rest[..semi];
                        rest = &rest[semi..];
                    }
                    None => {
                        value = rest;
                        rest = "";
                    }
                }
            }
            // Skip the separator between tokens.
            rest = rest.strip_prefix(';').unwrap_or(rest);

            match key {
                "host" if !value.is_empty() => config.host = value.to_string(),
                "port" => {
                    if let Ok(port) = value.trim().parse::<u16>() {
                        if port != 0 {
                            config.port = port;
                        }
                    }
                }
                _ => {}
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_keeps_defaults() {
        assert_eq!(ClientConfig::parse(""), ClientConfig::default());
    }

    #[test]
    fn host_and_port_parse() {
        let config = ClientConfig::parse("host=gpu-box;port=4242");
        assert_eq!(config.host, "gpu-box");
        assert_eq!(config.port, 4242);
    }

    #[test]
    fn quoted_host_may_contain_semicolons() {
        let config = ClientConfig::parse("host=\"weird;name\";port=99");
        assert_eq!(config.host, "weird;name");
        assert_eq!(config.port, 99);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = ClientConfig::parse("timeout=5;host=h;debug=1");
        assert_eq!(config.host, "h");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn bad_port_is_ignored() {
        let config = ClientConfig::parse("port=notanumber;host=h");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, "h");

        let config = ClientConfig::parse("port=0");
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
