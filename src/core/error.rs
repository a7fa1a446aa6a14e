use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidYaml,
    ConfigInvalidValue,

    AliasDuplicate,
    AliasUnknown,
    StartNotFound,

    GraphCyclic,

    RemoteInitFailed,
    RemoteRequestFailed,

    InternalIoError,
    InternalJsonError,
    InternalInvariant,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidYaml => "config.invalid_yaml",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::AliasDuplicate => "alias.duplicate",
            ErrorCode::AliasUnknown => "alias.unknown",
            ErrorCode::StartNotFound => "start.not_found",

            ErrorCode::GraphCyclic => "graph.cyclic",

            ErrorCode::RemoteInitFailed => "remote.init_failed",
            ErrorCode::RemoteRequestFailed => "remote.request_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalInvariant => "internal.invariant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidYamlDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateAliasDetails {
    pub alias: String,
    pub existing_job: String,
    pub duplicate_job: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownAliasDetails {
    pub alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartNotFoundDetails {
    pub alias: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CyclicDependencyDetails {
    pub cycle: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInitFailedDetails {
    pub endpoint: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvariantDetails {
    pub context: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let details = serde_json::to_value(ConfigMissingKeyDetails {
            key: key.into(),
            path,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
    }

    pub fn config_invalid_yaml(path: impl Into<String>, err: serde_yml::Error) -> Self {
        let details = serde_json::to_value(ConfigInvalidYamlDetails {
            path: path.into(),
            error: err.to_string(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ConfigInvalidYaml,
            "Invalid YAML in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = serde_json::to_value(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn alias_duplicate(
        alias: impl Into<String>,
        existing_job: impl Into<String>,
        duplicate_job: impl Into<String>,
    ) -> Self {
        let alias = alias.into();
        let details = serde_json::to_value(DuplicateAliasDetails {
            alias: alias.clone(),
            existing_job: existing_job.into(),
            duplicate_job: duplicate_job.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::AliasDuplicate,
            format!("Alias '{}' is declared more than once", alias),
            details,
        )
    }

    pub fn alias_unknown(alias: impl Into<String>, context: Option<String>) -> Self {
        let alias = alias.into();
        let details = serde_json::to_value(UnknownAliasDetails {
            alias: alias.clone(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::AliasUnknown,
            format!("Unknown alias '{}'", alias),
            details,
        )
        .with_hint("Run 'cascade check' to list configured aliases")
    }

    pub fn start_not_found(alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let details = serde_json::to_value(StartNotFoundDetails {
            alias: alias.clone(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::StartNotFound,
            format!("Start alias '{}' is not configured", alias),
            details,
        )
        .with_hint("Run 'cascade check' to list configured aliases")
    }

    pub fn graph_cyclic(cycle: Vec<String>) -> Self {
        let rendered = cycle.join(" -> ");
        let details = serde_json::to_value(CyclicDependencyDetails { cycle })
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::GraphCyclic,
            format!("Cyclic dependency: {}", rendered),
            details,
        )
    }

    pub fn remote_init_failed(endpoint: impl Into<String>, error: impl Into<String>) -> Self {
        let details = serde_json::to_value(RemoteInitFailedDetails {
            endpoint: endpoint.into(),
            error: error.into(),
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::RemoteInitFailed,
            "Failed to initialize the Jenkins client",
            details,
        )
        .with_retryable(true)
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(InternalIoErrorDetails {
            error: error.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(InternalJsonErrorDetails {
            error: error.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_invariant(context: impl Into<String>, pending: Vec<String>) -> Self {
        let details = serde_json::to_value(InvariantDetails {
            context: context.into(),
            pending,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::InternalInvariant,
            "Internal invariant violated",
            details,
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }
}
