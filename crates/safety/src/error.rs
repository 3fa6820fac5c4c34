/// Session configuration errors. Fatal: returned from constructors, never from `update`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported car: {0}")]
    UnsupportedPlatform(String),

    #[error("platform `mock` needs a GPS subscription for its speed source")]
    MissingGpsSource,

    #[error("invalid configuration field `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
}
