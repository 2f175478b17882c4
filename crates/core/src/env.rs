// Environment variable helpers shared by providers and binaries.

use crate::error::Error;

pub fn get_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

pub fn require_env_var(key: &str) -> Result<String, Error> {
    get_env_var(key).ok_or_else(|| Error::MissingEnv(key.to_string()))
}
