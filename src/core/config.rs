use serde::Deserialize;

use crate::error::Error;
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::registry::AliasRegistry;
use crate::Result;

pub const DEFAULT_CONFIG_PATH: &str = "~/.cascade.yml";

/// One `alias: job` declaration, in file order.
#[derive(Debug, Clone)]
pub struct AliasDecl {
    pub alias: String,
    pub job: String,
}

/// One `dependent: dependency` declaration, in file order.
#[derive(Debug, Clone)]
pub struct DependencyDecl {
    pub dependent: String,
    pub dependency: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: String,
    pub api_token: String,
}

/// Parsed and validated configuration file.
///
/// Alias and dependency declarations keep their file order; the planner's
/// tie-break depends on it.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub auth: AuthConfig,
    pub aliases: Vec<AliasDecl>,
    pub dependencies: Vec<DependencyDecl>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    endpoint: Option<String>,
    auth: Option<RawAuth>,
    aliases: Option<Vec<serde_yml::Mapping>>,
    dependencies: Option<Vec<serde_yml::Mapping>>,
}

#[derive(Debug, Deserialize)]
struct RawAuth {
    username: Option<String>,
    #[serde(rename = "api-token")]
    api_token: Option<String>,
}

/// Load a config file. The path may start with `~`.
pub fn load(path: &str) -> Result<Config> {
    let expanded = shellexpand::tilde(path).to_string();
    let text = std::fs::read_to_string(&expanded).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", expanded)))
            .with_hint(format!("Create {} or pass -f/--config <PATH>", path))
    })?;
    parse(&text, &expanded)
}

pub fn parse(text: &str, path: &str) -> Result<Config> {
    let raw: RawConfig =
        serde_yml::from_str(text).map_err(|e| Error::config_invalid_yaml(path, e))?;

    let endpoint = match raw.endpoint {
        Some(value) if !value.trim().is_empty() => value.trim().trim_end_matches('/').to_string(),
        Some(_) => {
            return Err(Error::config_invalid_value(
                "endpoint",
                None,
                "endpoint must not be empty",
            ))
        }
        None => return Err(Error::config_missing_key("endpoint", Some(path.to_string()))),
    };

    let auth = match raw.auth {
        Some(auth) => {
            let username = require_auth_field("auth.username", auth.username, path)?;
            let api_token = require_auth_field("auth.api-token", auth.api_token, path)?;
            AuthConfig {
                username,
                api_token,
            }
        }
        None => return Err(Error::config_missing_key("auth", Some(path.to_string()))),
    };

    let aliases = match raw.aliases {
        Some(maps) => flatten_pairs("aliases", maps)?
            .into_iter()
            .map(|(alias, job)| AliasDecl { alias, job })
            .collect::<Vec<_>>(),
        None => return Err(Error::config_missing_key("aliases", Some(path.to_string()))),
    };
    if aliases.is_empty() {
        return Err(Error::config_invalid_value(
            "aliases",
            None,
            "at least one alias must be declared",
        ));
    }

    let dependencies = match raw.dependencies {
        Some(maps) => flatten_pairs("dependencies", maps)?
            .into_iter()
            .map(|(dependent, dependency)| DependencyDecl {
                dependent,
                dependency,
            })
            .collect::<Vec<_>>(),
        None => Vec::new(),
    };

    Ok(Config {
        endpoint,
        auth,
        aliases,
        dependencies,
        path: path.to_string(),
    })
}

impl Config {
    /// Registry over the alias declarations, in file order.
    pub fn registry(&self) -> Result<AliasRegistry> {
        let mut registry = AliasRegistry::new();
        for decl in &self.aliases {
            registry.register(&decl.alias, &decl.job)?;
        }
        Ok(registry)
    }

    /// Validated dependency graph over `registry`.
    pub fn graph(&self, registry: &AliasRegistry) -> Result<DependencyGraph> {
        let mut builder = GraphBuilder::new(registry);
        for decl in &self.dependencies {
            builder.add_edge(&decl.dependent, &decl.dependency)?;
        }
        builder.build()
    }
}

fn require_auth_field(key: &str, value: Option<String>, path: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::config_missing_key(key, Some(path.to_string()))),
    }
}

/// Flatten a list of YAML mappings into ordered (key, value) string pairs.
/// Single-entry mappings are the documented shape; multi-entry mappings are
/// accepted and flattened in mapping order.
fn flatten_pairs(section: &str, maps: Vec<serde_yml::Mapping>) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for mapping in maps {
        for (key, value) in mapping {
            let key = string_entry(section, key)?;
            let value = string_entry(section, value)?;
            pairs.push((key, value));
        }
    }
    Ok(pairs)
}

fn string_entry(section: &str, value: serde_yml::Value) -> Result<String> {
    match value {
        serde_yml::Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => {
            let rendered = serde_yml::to_string(&other)
                .ok()
                .map(|s| s.trim().to_string());
            Err(Error::config_invalid_value(
                section,
                rendered,
                "entries must be non-empty strings",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const FULL: &str = r#"
endpoint: https://jenkins.example.com/
auth:
  username: ci-bot
  api-token: "11aabbcc"
aliases:
  - core: platform/core-lib
  - api: platform/api-service
  - web: platform/web-frontend
dependencies:
  - api: core
  - web: api
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse(FULL, "test.yml").unwrap();

        assert_eq!(config.endpoint, "https://jenkins.example.com");
        assert_eq!(config.auth.username, "ci-bot");
        assert_eq!(config.auth.api_token, "11aabbcc");
        assert_eq!(config.aliases.len(), 3);
        assert_eq!(config.aliases[0].alias, "core");
        assert_eq!(config.aliases[2].job, "platform/web-frontend");
        assert_eq!(config.dependencies.len(), 2);
        assert_eq!(config.dependencies[1].dependent, "web");
        assert_eq!(config.dependencies[1].dependency, "api");
    }

    #[test]
    fn test_alias_declaration_order_is_preserved() {
        let text = r#"
endpoint: https://jenkins.example.com
auth: { username: u, api-token: t }
aliases:
  - zeta: jobs/zeta
  - alpha: jobs/alpha
  - mid: jobs/mid
"#;
        let config = parse(text, "test.yml").unwrap();
        let names: Vec<&str> = config.aliases.iter().map(|a| a.alias.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_multi_entry_mapping_is_flattened_in_order() {
        let text = r#"
endpoint: https://jenkins.example.com
auth: { username: u, api-token: t }
aliases:
  - first: jobs/first
    second: jobs/second
  - third: jobs/third
"#;
        let config = parse(text, "test.yml").unwrap();
        let names: Vec<&str> = config.aliases.iter().map(|a| a.alias.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_endpoint() {
        let text = "auth: { username: u, api-token: t }\naliases:\n  - a: jobs/a\n";
        let err = parse(text, "test.yml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
        assert_eq!(err.details["key"], "endpoint");
    }

    #[test]
    fn test_missing_auth_token() {
        let text = "endpoint: https://x\nauth: { username: u }\naliases:\n  - a: jobs/a\n";
        let err = parse(text, "test.yml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
        assert_eq!(err.details["key"], "auth.api-token");
    }

    #[test]
    fn test_missing_aliases_section() {
        let text = "endpoint: https://x\nauth: { username: u, api-token: t }\n";
        let err = parse(text, "test.yml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingKey);
        assert_eq!(err.details["key"], "aliases");
    }

    #[test]
    fn test_empty_alias_list_is_rejected() {
        let text = "endpoint: https://x\nauth: { username: u, api-token: t }\naliases: []\n";
        let err = parse(text, "test.yml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn test_non_string_job_is_rejected() {
        let text = "endpoint: https://x\nauth: { username: u, api-token: t }\naliases:\n  - a: 42\n";
        let err = parse(text, "test.yml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
        assert_eq!(err.details["key"], "aliases");
    }

    #[test]
    fn test_unparseable_yaml() {
        let err = parse("endpoint: [unclosed", "test.yml").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidYaml);
        assert_eq!(err.details["path"], "test.yml");
    }

    #[test]
    fn test_registry_and_graph_wiring() {
        let config = parse(FULL, "test.yml").unwrap();
        let registry = config.registry().unwrap();
        let graph = config.graph(&registry).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_duplicate_alias_surfaces_from_registry() {
        let text = r#"
endpoint: https://jenkins.example.com
auth: { username: u, api-token: t }
aliases:
  - core: jobs/one
  - core: jobs/two
"#;
        let config = parse(text, "test.yml").unwrap();
        let err = config.registry().unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasDuplicate);
    }

    #[test]
    fn test_unknown_dependency_surfaces_from_graph() {
        let text = r#"
endpoint: https://jenkins.example.com
auth: { username: u, api-token: t }
aliases:
  - core: jobs/core
dependencies:
  - core: ghost
"#;
        let config = parse(text, "test.yml").unwrap();
        let registry = config.registry().unwrap();
        let err = config.graph(&registry).unwrap_err();
        assert_eq!(err.code, ErrorCode::AliasUnknown);
        assert_eq!(err.details["alias"], "ghost");
    }
}
