//! Tests for config module

#[cfg(test)]
mod tests {
    use crate::config::*;

    // ========================================================================
    // JoinStrategy tests
    // ========================================================================

    #[test]
    fn test_join_strategy_default_is_pairwise() {
        assert_eq!(JoinStrategy::default(), JoinStrategy::Pairwise);
    }

    #[test]
    fn test_join_strategy_serialization() {
        // Arrange
        let strategy = JoinStrategy::Automaton;

        // Act
        let json = serde_json::to_string(&strategy).expect("serialize");
        let deserialized: JoinStrategy = serde_json::from_str(&json).expect("deserialize");

        // Assert
        assert_eq!(json, "\"automaton\"");
        assert_eq!(deserialized, strategy);
    }

    // ========================================================================
    // LexwatchConfig default tests
    // ========================================================================

    #[test]
    fn test_config_default_values() {
        // Arrange & Act
        let config = LexwatchConfig::default();

        // Assert
        assert_eq!(config.engine.workers, 0);
        assert_eq!(config.engine.max_batch_documents, 1024);
        assert_eq!(config.engine.join_strategy, JoinStrategy::Pairwise);
        assert_eq!(config.interner.shards, 16);
        assert_eq!(config.limits.max_document_bytes, 65536);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_effective_workers() {
        let mut config = LexwatchConfig::default();
        assert!(config.engine.effective_workers() >= 1);

        config.engine.workers = 3;
        assert_eq!(config.engine.effective_workers(), 3);
    }

    // ========================================================================
    // TOML parsing tests
    // ========================================================================

    #[test]
    fn test_config_from_toml_minimal() {
        // Arrange
        let toml = r#"
[engine]
join_strategy = "automaton"
"#;

        // Act
        let config = LexwatchConfig::from_toml(toml).expect("parse");

        // Assert
        assert_eq!(config.engine.join_strategy, JoinStrategy::Automaton);
        // Other values should be defaults
        assert_eq!(config.engine.max_batch_documents, 1024);
        assert_eq!(config.interner.shards, 16);
    }

    #[test]
    fn test_config_from_toml_full() {
        // Arrange
        let toml = r#"
[engine]
workers = 8
max_batch_documents = 64
batch_linger_ms = 5
join_strategy = "pairwise"

[interner]
shards = 32
initial_capacity = 1024
max_load_percent = 60

[limits]
max_document_bytes = 4096

[logging]
level = "debug"
format = "compact"
"#;

        // Act
        let config = LexwatchConfig::from_toml(toml).expect("parse");

        // Assert
        assert_eq!(config.engine.workers, 8);
        assert_eq!(config.engine.max_batch_documents, 64);
        assert_eq!(config.engine.batch_linger_ms, 5);
        assert_eq!(config.interner.shards, 32);
        assert_eq!(config.interner.initial_capacity, 1024);
        assert_eq!(config.interner.max_load_percent, 60);
        assert_eq!(config.limits.max_document_bytes, 4096);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml_invalid_strategy() {
        // Arrange
        let toml = r#"
[engine]
join_strategy = "quantum"
"#;

        // Act
        let result = LexwatchConfig::from_toml(toml);

        // Assert
        assert!(result.is_err());
    }

    // Loader tests run inside `figment::Jail`, which serializes them and
    // restores the process environment and working directory afterwards.

    #[test]
    fn test_config_load_from_file() {
        figment::Jail::expect_with(|jail| {
            // Arrange
            jail.create_file("lexwatch.toml", "[engine]\nworkers = 2\n")?;

            // Act
            let config = LexwatchConfig::load().expect("load");

            // Assert
            assert_eq!(config.engine.workers, 2);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_missing_file_uses_defaults() {
        figment::Jail::expect_with(|jail| {
            let path = jail.directory().join("absent.toml");
            let config = LexwatchConfig::load_from_path(path).expect("load");
            assert_eq!(config.engine.max_batch_documents, 1024);
            Ok(())
        });
    }

    #[test]
    fn test_config_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            // Arrange
            jail.create_file(
                "lexwatch.toml",
                "[engine]\nworkers = 2\nmax_batch_documents = 7\n",
            )?;
            jail.set_env("LEXWATCH_ENGINE__WORKERS", "3");
            jail.set_env("LEXWATCH_LOGGING__LEVEL", "debug");

            // Act
            let config = LexwatchConfig::load().expect("load");

            // Assert
            assert_eq!(config.engine.workers, 3);
            assert_eq!(config.engine.max_batch_documents, 7);
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_config_env_invalid_value_is_parse_error() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("LEXWATCH_ENGINE__WORKERS", "many");
            assert!(matches!(
                LexwatchConfig::load(),
                Err(ConfigError::ParseError(_))
            ));
            Ok(())
        });
    }

    // ========================================================================
    // Validation tests
    // ========================================================================

    #[test]
    fn test_config_validate_success() {
        let config = LexwatchConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_zero_batch() {
        // Arrange
        let config = LexwatchConfig::default().with_max_batch_documents(0);

        // Act
        let result = config.validate();

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "engine.max_batch_documents"
        ));
    }

    #[test]
    fn test_config_validate_shards_not_power_of_two() {
        let mut config = LexwatchConfig::default();
        config.interner.shards = 12;

        let result = config.validate();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "interner.shards"
        ));
    }

    #[test]
    fn test_config_validate_load_factor_out_of_range() {
        let mut config = LexwatchConfig::default();
        config.interner.max_load_percent = 99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_invalid_log_level() {
        let mut config = LexwatchConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_invalid_log_format() {
        let mut config = LexwatchConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    // ========================================================================
    // Serialization tests
    // ========================================================================

    #[test]
    fn test_config_roundtrip() {
        // Arrange
        let config = LexwatchConfig::default()
            .with_workers(6)
            .with_join_strategy(JoinStrategy::Automaton);

        // Act
        let toml = config.to_toml().expect("serialize");
        let parsed = LexwatchConfig::from_toml(&toml).expect("parse");

        // Assert
        assert_eq!(parsed.engine.workers, 6);
        assert_eq!(parsed.engine.join_strategy, JoinStrategy::Automaton);
    }
}
