// Built-in providers and the startup-time registration table.
//
// Adding a provider: implement ToolProvider in a new module here and add
// one ProviderSpec entry below. Nothing else in the gateway changes.

pub mod weather;

use crate::registry::ProviderSpec;

pub fn builtin_providers() -> &'static [ProviderSpec] {
    &[ProviderSpec {
        slug: "weather",
        description: "Weather information and forecasting",
        factory: weather::factory,
    }]
}
