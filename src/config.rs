//! Server configuration.
//!
//! Nothing is read from the environment or from files; [`Config::default`]
//! is the deployed configuration and the builder exists for tests and
//! embedding.

/// Fixed listening port.
pub const PORT: u16 = 5000;

/// Hard cap on a request body. One byte more and the connection is dropped.
pub const MAX_BODY_BYTES: usize = 1_000_000;

/// Cap on a request head (request line plus headers).
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Runtime configuration for a [`Server`](crate::Server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TCP listen address (host:port)
    pub listen_addr: String,

    /// Max request body size in bytes
    pub max_body_bytes: usize,

    /// Max request head size in bytes
    pub max_head_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{PORT}"),
            max_body_bytes: MAX_BODY_BYTES,
            max_head_bytes: MAX_HEAD_BYTES,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn max_body_bytes(mut self, bytes: usize) -> Self {
        self.config.max_body_bytes = bytes;
        self
    }

    pub fn max_head_bytes(mut self, bytes: usize) -> Self {
        self.config.max_head_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.max_body_bytes, 1_000_000);
        assert_eq!(config.max_head_bytes, 65_536);
    }

    #[test]
    fn builder_overrides_only_what_it_sets() {
        let config = Config::builder()
            .listen_addr("127.0.0.1:0")
            .max_body_bytes(16)
            .build();
        assert_eq!(config.listen_addr, "127.0.0.1:0");
        assert_eq!(config.max_body_bytes, 16);
        assert_eq!(config.max_head_bytes, MAX_HEAD_BYTES);
    }
}
