//! Tests for the logger module

use crate::logger::config::*;
use std::path::PathBuf;

mod config_property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any enabled output with a non-empty path validates
        #[test]
        fn property_valid_configs_validate(
            console_enabled in any::<bool>(),
            file_enabled in any::<bool>(),
            colored in any::<bool>(),
            append in any::<bool>(),
            level in prop::sample::select(vec!["trace", "debug", "info", "warn", "error", "WARN"]),
            format in prop::sample::select(vec![LogFormat::Full, LogFormat::Compact, LogFormat::Json]),
        ) {
            prop_assume!(console_enabled || file_enabled);

            let config = LoggerConfig {
                console: ConsoleConfig::new(console_enabled, colored),
                file: FileConfig {
                    enabled: file_enabled,
                    path: PathBuf::from("logs/test.log"),
                    append,
                    format,
                },
                level: level.to_string(),
            };

            prop_assert!(config.validate().is_ok());
            prop_assert!(config.parse_level().is_ok());
        }

        /// Anything outside the five level names is rejected
        #[test]
        fn property_invalid_levels_fail(level in "[a-z]{1,12}") {
            prop_assume!(!["trace", "debug", "info", "warn", "error"].contains(&level.as_str()));

            let config = LoggerConfig {
                level,
                ..LoggerConfig::default()
            };
            prop_assert!(config.validate().is_err());
        }
    }
}

mod output_tests {
    use super::*;
    use crate::logger::{build_subscriber, init_logger};
    use proptest::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    const FORMATS: [LogFormat; 3] = [LogFormat::Full, LogFormat::Compact, LogFormat::Json];

    fn file_logger(path: PathBuf, level: &str, format: LogFormat, console: bool) -> LoggerConfig {
        LoggerConfig {
            console: ConsoleConfig::new(console, true),
            file: FileConfig::new(true, path, false, format).unwrap(),
            level: level.to_string(),
        }
    }

    /// Run `f` under the subscriber built for a file-logging config, then
    /// return what was written to the file.
    fn capture(level: &str, format: LogFormat, console: bool, f: impl FnOnce()) -> String {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("out.log");
        let config = file_logger(path.clone(), level, format, console);

        let subscriber = build_subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, f);

        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_level_filtering() {
        let output = capture("warn", LogFormat::Full, false, || {
            tracing::info!("tier write skipped");
            tracing::warn!("tier write failed");
        });
        assert!(output.contains("tier write failed"));
        assert!(!output.contains("tier write skipped"));
    }

    #[test]
    fn test_json_lines() {
        let output = capture("debug", LogFormat::Json, false, || {
            tracing::debug!(cache = "default", "cache hit");
        });
        let line = output.lines().next().unwrap();
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["fields"]["message"], "cache hit");
        assert_eq!(value["fields"]["cache"], "default");
    }

    #[test]
    fn test_file_only_every_format() {
        for format in FORMATS {
            let output = capture("info", format, false, || {
                tracing::info!(tier = "shared", "fan-out complete");
            });
            assert!(output.contains("fan-out complete"), "format: {:?}", format);
            assert!(output.contains("shared"), "format: {:?}", format);
        }
    }

    #[test]
    fn test_console_and_file_every_format() {
        for format in FORMATS {
            let output = capture("info", format, true, || {
                tracing::warn!(tier = "down", "tier failed");
            });
            assert!(output.contains("tier failed"), "format: {:?}", format);
            assert!(!output.contains('\x1b'), "ANSI codes in file for {:?}", format);
        }
    }

    #[test]
    fn test_console_only_builds() {
        let config = LoggerConfig {
            console: ConsoleConfig::new(true, false),
            ..LoggerConfig::default()
        };
        assert!(build_subscriber(&config).is_ok());
    }

    #[test]
    fn test_no_outputs_rejected() {
        let config = LoggerConfig {
            console: ConsoleConfig::new(false, false),
            ..LoggerConfig::default()
        };
        assert!(build_subscriber(&config).is_err());
    }

    #[test]
    fn test_unopenable_log_file_rejected() {
        let dir = tempdir().unwrap();
        // The log path is an existing directory
        let config = file_logger(dir.path().to_path_buf(), "info", LogFormat::Full, false);
        assert!(build_subscriber(&config).is_err());
    }

    // The only test that installs the global subscriber
    #[test]
    fn test_init_logger_installs_once() {
        let config = LoggerConfig {
            console: ConsoleConfig::new(true, false),
            ..LoggerConfig::default()
        };
        assert!(init_logger(config.clone()).is_ok());
        assert!(init_logger(config).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// Messages always land in the file regardless of format
        #[test]
        fn property_file_output_in_every_format(
            message in "[a-zA-Z0-9 ]{1,40}",
            format in prop::sample::select(FORMATS.to_vec()),
        ) {
            let trimmed = message.trim().to_string();
            prop_assume!(!trimmed.is_empty());
            let output = capture("info", format, false, || tracing::info!("{}", trimmed));
            prop_assert!(output.contains(&trimmed));
        }
    }
}
