/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` and call `Config::from_env()` at startup.
/// Field `foo_bar` is read from env var `FOO_BAR`.
///
/// # Panics
///
/// Panics if any required env var is missing or cannot be deserialized.
pub trait Config: Sized + ::serde::de::DeserializeOwned {
    fn from_env() -> Self {
        envy::from_env().expect("failed to load config from environment")
    }

    /// Non-panicking variant over an explicit variable set (used by tests).
    fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
