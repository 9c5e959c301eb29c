use secrecy::Secret;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub target: TargetSettings,
}

/// Coordinates of the deployed Story Spoiler service under test.
#[derive(serde::Deserialize, Clone)]
pub struct TargetSettings {
    pub base_url: String,
    pub username: String,
    pub password: Secret<String>,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        // Environment overrides, e.g. `APP_TARGET__BASE_URL=http://localhost:8080`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
