//! Integration tests for TOML configuration loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;
use refract_config::{ConfigError, RefractConfig};

#[test]
fn loads_rpc_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[rpc]
rebroadcast_notifications = false
validate_params = true
max_upload_bytes = 1024
pretty_schemas = true
"#,
        )?;

        let config = RefractConfig::from_figment(
            &Figment::from(Serialized::defaults(RefractConfig::default()))
                .merge(Toml::file("config.toml")),
        )
        .expect("config loads");

        assert!(!config.rpc.rebroadcast_notifications);
        assert!(config.rpc.validate_params);
        assert_eq!(config.rpc.max_upload_bytes, 1024);
        assert!(config.rpc.pretty_schemas);
        assert_eq!(config.log.level, "warn");
        Ok(())
    });
}

#[test]
fn project_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".refract")?;
        jail.create_file(".refract/config.toml", "[log]\nlevel = \"debug\"\n")?;

        let config = RefractConfig::load().expect("config loads");
        assert_eq!(config.log.level, "debug");
        assert!(config.rpc.rebroadcast_notifications);
        Ok(())
    });
}

#[test]
fn partial_sections_keep_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[rpc]\nvalidate_params = true\n")?;

        let config: RefractConfig = Figment::from(Serialized::defaults(RefractConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(config.rpc.validate_params);
        assert_eq!(config.rpc.max_upload_bytes, 64 * 1024 * 1024);
        Ok(())
    });
}

#[test]
fn invalid_values_are_reported() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[rpc]\nmax_upload_bytes = 0\n")?;

        let result = RefractConfig::from_figment(
            &Figment::from(Serialized::defaults(RefractConfig::default()))
                .merge(Toml::file("config.toml")),
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "rpc.max_upload_bytes"
        ));
        Ok(())
    });
}
