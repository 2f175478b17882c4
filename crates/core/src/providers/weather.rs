// Weather provider backed by the OpenWeatherMap API.

use crate::env::{get_env_var, require_env_var};
use crate::error::Error;
use crate::provider::{ToolProvider, ToolSet};
use crate::types::{ClientConfig, ToolDefinition, ToolResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
pub const BASE_URL_ENV: &str = "OPENWEATHERMAP_BASE_URL";

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const FORECASTS_PER_DAY: u32 = 8; // upstream returns 3-hourly entries

/// Registration-table factory. Fails (and the provider is skipped) when
/// the upstream credential is absent.
pub fn factory(config: ClientConfig) -> Result<Arc<dyn ToolProvider>, Error> {
    let api_key = require_env_var(API_KEY_ENV)?;
    let base_url = get_env_var(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let provider =
        WeatherProvider::new(config, api_key, base_url).map_err(|e| Error::ProviderLoad {
            name: "weather".to_string(),
            reason: e.to_string(),
        })?;
    Ok(Arc::new(provider))
}

pub struct WeatherProvider {
    config: ClientConfig,
    tools: ToolSet,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl WeatherProvider {
    pub fn new(config: ClientConfig, api_key: String, base_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("toolgate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let mut tools = ToolSet::new();
        tools.register(ToolDefinition {
            name: "get_current_weather".to_string(),
            description:
                "Get current weather conditions for a specific location (temperature in Celsius)"
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The location to get weather for (city name, city,country, or coordinates)"
                    },
                    "units": {
                        "type": "string",
                        "enum": ["metric"],
                        "default": "metric",
                        "description": "Temperature units (fixed to Celsius)"
                    }
                },
                "required": ["location"]
            }),
        });
        tools.register(ToolDefinition {
            name: "get_weather_forecast".to_string(),
            description:
                "Get weather forecast for a specific location (temperature in Celsius)".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The location to get forecast for"
                    },
                    "days": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 5,
                        "default": 3,
                        "description": "Number of days for forecast (1-5)"
                    },
                    "units": {
                        "type": "string",
                        "enum": ["metric"],
                        "default": "metric",
                        "description": "Temperature units (fixed to Celsius)"
                    }
                },
                "required": ["location"]
            }),
        });

        Ok(Self {
            config,
            tools,
            api_key,
            base_url,
            http,
        })
    }

    async fn current_weather(&self, arguments: serde_json::Value) -> Result<ToolResult> {
        let args: CurrentWeatherArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_current_weather")?;

        let url = format!("{}/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", args.location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("Weather API request failed")?
            .error_for_status()
            .context("Weather API returned an error")?;

        let data: CurrentWeatherResponse = response
            .json()
            .await
            .context("Failed to decode weather API response")?;
        tracing::debug!(location = %args.location, "current weather response received");

        Ok(ToolResult::text(format_current_weather(&data)))
    }

    async fn forecast(&self, arguments: serde_json::Value) -> Result<ToolResult> {
        let args: ForecastArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_weather_forecast")?;
        let days = args.days.unwrap_or(3).clamp(1, 5);

        let url = format!("{}/forecast", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", args.location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("cnt", (days * FORECASTS_PER_DAY).to_string().as_str()),
            ])
            .send()
            .await
            .context("Weather API request failed")?
            .error_for_status()
            .context("Weather API returned an error")?;

        let data: ForecastResponse = response
            .json()
            .await
            .context("Failed to decode forecast API response")?;
        tracing::debug!(location = %args.location, days, "forecast response received");

        Ok(ToolResult::text(format_forecast(&data, days)))
    }
}

#[async_trait::async_trait]
impl ToolProvider for WeatherProvider {
    fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn tools(&self) -> &[ToolDefinition] {
        self.tools.as_slice()
    }

    async fn execute_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolResult> {
        let result = match name {
            "get_current_weather" => self.current_weather(arguments).await,
            "get_weather_forecast" => self.forecast(arguments).await,
            _ => return Ok(ToolResult::error(format!("Unknown tool: {name}"))),
        };

        // Upstream and decode failures are tool-semantics errors, not
        // transport errors.
        match result {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "weather tool failed");
                Ok(ToolResult::error(format!("Error: {e:#}")))
            }
        }
    }

    fn help_text(&self) -> Option<String> {
        Some(
            "Weather Assistant Help

Available Tools:
1. get_current_weather(location, units=metric)
   - Get current weather conditions for any location
   - Location can be city name, \"city,country\", or coordinates
   - Units: metric (\u{b0}C) - temperature always in Celsius

2. get_weather_forecast(location, days=3, units=metric)
   - Get weather forecast for 1-5 days
   - Same location options as current weather
   - Temperature always in Celsius

Examples:
- get_current_weather(\"New York\")
- get_weather_forecast(\"London,UK\", 5)

All weather data is provided by OpenWeatherMap."
                .to_string(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherArgs {
    location: String,
}

#[derive(Debug, Deserialize)]
struct ForecastArgs {
    location: String,
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    name: String,
    sys: SysInfo,
    main: MainInfo,
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Option<WindInfo>,
}

#[derive(Debug, Deserialize)]
struct SysInfo {
    country: String,
}

#[derive(Debug, Deserialize)]
struct MainInfo {
    temp: f64,
    #[serde(default)]
    humidity: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindInfo {
    #[serde(default)]
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    city: CityInfo,
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct CityInfo {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: MainInfo,
    weather: Vec<Condition>,
}

fn format_current_weather(data: &CurrentWeatherResponse) -> String {
    let condition = data
        .weather
        .first()
        .map(|c| title_case(&c.description))
        .unwrap_or_default();

    let mut text = format!("Current weather in {}, {}:\n", data.name, data.sys.country);
    text.push_str(&format!("Temperature: {}\u{b0}C\n", data.main.temp));
    text.push_str(&format!("Condition: {condition}\n"));
    if let Some(humidity) = data.main.humidity {
        text.push_str(&format!("Humidity: {humidity}%\n"));
    }
    if let Some(speed) = data.wind.as_ref().and_then(|w| w.speed) {
        text.push_str(&format!("Wind Speed: {speed} m/s\n"));
    }
    if let Some(pressure) = data.main.pressure {
        text.push_str(&format!("Pressure: {pressure} hPa\n"));
    }
    text
}

fn format_forecast(data: &ForecastResponse, days: u32) -> String {
    let mut text = format!(
        "Weather forecast for {}, {}:\n\n",
        data.city.name, data.city.country
    );

    let mut current_date: Option<&str> = None;
    for entry in data.list.iter().take((days * FORECASTS_PER_DAY) as usize) {
        let (date, time) = entry.dt_txt.split_once(' ').unwrap_or((entry.dt_txt.as_str(), ""));

        if current_date != Some(date) {
            if current_date.is_some() {
                text.push('\n');
            }
            text.push_str(&format!("Date: {date}\n"));
            current_date = Some(date);
        }

        let desc = entry
            .weather
            .first()
            .map(|c| title_case(&c.description))
            .unwrap_or_default();
        text.push_str(&format!("  {time}: {}\u{b0}C, {desc}\n", entry.main.temp));
    }
    text
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
