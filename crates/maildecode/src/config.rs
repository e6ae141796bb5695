//! Parser configuration.

/// Resource limits applied while decoding a message.
///
/// Both limits are off by default, so untrusted input should be parsed with
/// an explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    /// Maximum multipart nesting depth. The top-level multipart counts as 1.
    pub max_depth: Option<usize>,
    /// Maximum raw message size in bytes.
    pub max_message_size: Option<usize>,
}

impl Config {
    /// Creates a configuration without limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: None,
            max_message_size: None,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for parser configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigBuilder {
    max_depth: Option<usize>,
    max_message_size: Option<usize>,
}

impl ConfigBuilder {
    /// Creates a new builder without limits.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: None,
            max_message_size: None,
        }
    }

    /// Sets the maximum multipart nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the maximum message size in bytes.
    #[must_use]
    pub const fn max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub const fn build(self) -> Config {
        Config {
            max_depth: self.max_depth,
            max_message_size: self.max_message_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_unbounded() {
        let config = Config::default();
        assert_eq!(config.max_depth, None);
        assert_eq!(config.max_message_size, None);
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .max_depth(8)
            .max_message_size(25 * 1024 * 1024)
            .build();

        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.max_message_size, Some(25 * 1024 * 1024));
    }
}
