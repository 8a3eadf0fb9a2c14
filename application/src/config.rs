//! [`Config`]-related definitions.

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use serde::Deserialize;
use service::domain::{contract, price::ConditionMultipliers};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Code of the currency the trade-in history is summarized in.
    #[default("TZS".to_owned())]
    pub currency: String,

    /// Condition multipliers applied when a device is valued without any
    /// price schedule.
    pub multipliers: Multipliers,

    /// Terms every new contract is generated with.
    #[default(
        "The device is accepted as-is. The agreed value is final and is \
         credited towards the purchase of a new device."
            .to_owned()
    )]
    pub contract_terms: String,

    /// Ownership declaration every new contract is generated with.
    #[default(
        "I declare that I am the lawful owner of the device, and that it is \
         neither stolen nor subject to any financing agreement."
            .to_owned()
    )]
    pub ownership_declaration: String,
}

impl TryFrom<Service> for service::Config {
    type Error = InvalidServiceConfig;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        use InvalidServiceConfig as E;

        let Service {
            currency,
            multipliers:
                Multipliers {
                    excellent,
                    good,
                    fair,
                    poor,
                },
            contract_terms,
            ownership_declaration,
        } = value;

        let multiplier = |name: &'static str, val: String| {
            val.parse().map_err(|_| E::Multiplier(name, val))
        };

        Ok(Self {
            currency: currency.parse().map_err(|_| E::Currency(currency))?,
            default_multipliers: ConditionMultipliers {
                excellent: multiplier("excellent", excellent)?,
                good: multiplier("good", good)?,
                fair: multiplier("fair", fair)?,
                poor: multiplier("poor", poor)?,
            },
            contract_terms: contract::Terms::new(contract_terms)
                .ok_or(E::Blank("contract_terms"))?,
            ownership_declaration: contract::OwnershipDeclaration::new(
                ownership_declaration,
            )
            .ok_or(E::Blank("ownership_declaration"))?,
        })
    }
}

/// Condition multipliers configuration.
///
/// Each value is a decimal in `(0, 1]` range.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Multipliers {
    /// Multiplier of a device in an excellent condition.
    #[default("1.00".to_owned())]
    pub excellent: String,

    /// Multiplier of a device in a good condition.
    #[default("0.85".to_owned())]
    pub good: String,

    /// Multiplier of a device in a fair condition.
    #[default("0.70".to_owned())]
    pub fair: String,

    /// Multiplier of a device in a poor condition.
    #[default("0.50".to_owned())]
    pub poor: String,
}

/// Error of converting [`Service`] configuration into a [`service::Config`].
#[derive(Clone, Debug, Display, Error)]
pub enum InvalidServiceConfig {
    /// Text is blank.
    #[display("`service.{_0}` must not be blank")]
    Blank(#[error(not(source))] &'static str),

    /// Currency code is unknown.
    #[display("`service.currency` is unknown: `{_0}`")]
    Currency(#[error(not(source))] String),

    /// Multiplier is not a decimal in `(0, 1]` range.
    #[display("`service.multipliers.{_0}` must be in `(0, 1]` range: `{_1}`")]
    Multiplier(
        #[error(not(source))] &'static str,
        #[error(not(source))] String,
    ),
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::money::Currency;

    use super::{InvalidServiceConfig, Multipliers, Service};

    #[test]
    fn default_service_config_is_valid() {
        let config = service::Config::try_from(Service::default()).unwrap();

        assert_eq!(config.currency, Currency::Tzs);
        assert!(config.default_multipliers.is_monotonic());
        assert_eq!(config.default_multipliers.good.to_string(), "0.85");
    }

    #[test]
    fn rejects_out_of_range_multiplier() {
        let err = service::Config::try_from(Service {
            multipliers: Multipliers {
                poor: "1.5".to_owned(),
                ..Multipliers::default()
            },
            ..Service::default()
        })
        .unwrap_err();

        assert!(
            matches!(err, InvalidServiceConfig::Multiplier("poor", _)),
            "{err}",
        );
    }

    #[test]
    fn parses_currency_case_insensitively() {
        let config = service::Config::try_from(Service {
            currency: "usd".to_owned(),
            ..Service::default()
        })
        .unwrap();

        assert_eq!(config.currency, Currency::Usd);
    }
}
