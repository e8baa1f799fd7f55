use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),

    #[error("tier '{tier}' is missing required setting: {setting}")]
    MissingTierSetting {
        tier: &'static str,
        setting: &'static str,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
