//! Configuración de la aplicación.
//! Carga variables de entorno (.env) y las traduce a la entrada del Role
//! Resolver (`RoleInput`) más los valores por defecto (`RoleDefaults`).
//! Los flags de la CLI se aplican encima con `AppConfig::merge`.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use boot_core::constants::K3S_KUBECONFIG_PATH;
use boot_core::{RegistryLogin, RoleDefaults, RoleInput};
use once_cell::sync::Lazy;

use crate::errors::ConfigError;

/// Ruta del `.env` cargado, si existía. Se evalúa una sola vez.
static DOTENV: Lazy<Option<PathBuf>> = Lazy::new(|| dotenvy::dotenv().ok());

/// Carga `.env` (idempotente) y devuelve la ruta usada.
pub fn load_dotenv() -> Option<&'static PathBuf> {
    DOTENV.as_ref()
}

/// Configuración cargada del entorno.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Entrada cruda; los campos ausentes se completan desde `defaults`.
    pub input: RoleInput,
    pub defaults: RoleDefaults,
}

impl AppConfig {
    /// Lee la configuración del proceso (previa carga de `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let input = RoleInput { role: get("BOOTFLOW_ROLE").unwrap_or_default(),
                                join_url: get("BOOTFLOW_JOIN_URL").or_else(|| get("K3S_URL")),
                                join_token: get("BOOTFLOW_JOIN_TOKEN").or_else(|| get("K3S_TOKEN")),
                                namespaces: get("BOOTFLOW_NAMESPACES").map(|raw| split_list(&raw)),
                                dashboard: get("BOOTFLOW_DASHBOARD").map(|v| parse_bool("BOOTFLOW_DASHBOARD", &v))
                                                                    .transpose()?,
                                gitops: get("BOOTFLOW_GITOPS").map(|v| parse_bool("BOOTFLOW_GITOPS", &v)).transpose()? };

        let mut defaults = RoleDefaults::default();
        if let Some(raw) = get("BOOTFLOW_READINESS_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue { key: "BOOTFLOW_READINESS_TIMEOUT_SECS",
                                                                                value: raw.clone() })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue { key: "BOOTFLOW_READINESS_TIMEOUT_SECS",
                                                       value: raw });
            }
            defaults.readiness_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = get("BOOTFLOW_ARGOCD_MANIFEST_URL") {
            defaults.argocd_manifest_url = url;
        }
        defaults.kubeconfig_path = match get("BOOTFLOW_KUBECONFIG") {
            Some(path) => PathBuf::from(path),
            None => get("HOME").map(|home| PathBuf::from(home).join(".kube").join("config"))
                               .unwrap_or_else(|| PathBuf::from(K3S_KUBECONFIG_PATH)),
        };
        defaults.registry = registry_login(&get)?;

        Ok(Self { input, defaults })
    }

    /// Aplica encima de la configuración los valores que vinieron por CLI.
    pub fn merge(&self, cli: RoleInput) -> RoleInput {
        let base = self.input.clone();
        RoleInput { role: if cli.role.trim().is_empty() { base.role } else { cli.role },
                    join_url: cli.join_url.or(base.join_url),
                    join_token: cli.join_token.or(base.join_token),
                    namespaces: cli.namespaces.or(base.namespaces),
                    dashboard: cli.dashboard.or(base.dashboard),
                    gitops: cli.gitops.or(base.gitops) }
    }
}

/// El login al registry exige las tres variables o ninguna.
fn registry_login<G>(get: &G) -> Result<Option<RegistryLogin>, ConfigError>
    where G: Fn(&str) -> Option<String>
{
    let url = get("BOOTFLOW_REGISTRY_URL");
    let username = get("BOOTFLOW_REGISTRY_USER");
    let password = get("BOOTFLOW_REGISTRY_PASSWORD");
    match (url, username, password) {
        (None, None, None) => Ok(None),
        (Some(url), Some(username), Some(password)) => Ok(Some(RegistryLogin { url, username, password })),
        (url, username, _) => {
            let missing = if url.is_none() {
                "BOOTFLOW_REGISTRY_URL"
            } else if username.is_none() {
                "BOOTFLOW_REGISTRY_USER"
            } else {
                "BOOTFLOW_REGISTRY_PASSWORD"
            };
            Err(ConfigError::IncompleteRegistry { missing })
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key,
                                             value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.input.role.is_empty());
        assert!(cfg.input.namespaces.is_none());
        assert!(cfg.defaults.registry.is_none());
        assert_eq!(cfg.defaults.kubeconfig_path, PathBuf::from(K3S_KUBECONFIG_PATH));
    }

    #[test]
    fn script_variables_are_accepted_for_join() {
        let cfg = config(&[("BOOTFLOW_ROLE", "agent"), ("K3S_URL", "https://10.0.0.1:6443"), ("K3S_TOKEN", "K10x")]).unwrap();
        assert_eq!(cfg.input.join_url.as_deref(), Some("https://10.0.0.1:6443"));
        assert_eq!(cfg.input.join_token.as_deref(), Some("K10x"));
    }

    #[test]
    fn namespaces_toggles_and_timeout_are_parsed() {
        let cfg = config(&[("BOOTFLOW_NAMESPACES", "apps, monitoring,,"),
                           ("BOOTFLOW_DASHBOARD", "off"),
                           ("BOOTFLOW_READINESS_TIMEOUT_SECS", "60"),
                           ("HOME", "/home/ops")]).unwrap();
        assert_eq!(cfg.input.namespaces, Some(vec!["apps".to_string(), "monitoring".to_string()]));
        assert_eq!(cfg.input.dashboard, Some(false));
        assert_eq!(cfg.input.gitops, None);
        assert_eq!(cfg.defaults.readiness_timeout, Duration::from_secs(60));
        assert_eq!(cfg.defaults.kubeconfig_path, PathBuf::from("/home/ops/.kube/config"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(config(&[("BOOTFLOW_GITOPS", "maybe")]),
                         Err(ConfigError::InvalidValue { key: "BOOTFLOW_GITOPS", .. })));
        assert!(matches!(config(&[("BOOTFLOW_READINESS_TIMEOUT_SECS", "0")]), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn registry_requires_all_three_variables() {
        let err = config(&[("BOOTFLOW_REGISTRY_URL", "ghcr.io"), ("BOOTFLOW_REGISTRY_USER", "ci")]).unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteRegistry { missing: "BOOTFLOW_REGISTRY_PASSWORD" }));

        let cfg = config(&[("BOOTFLOW_REGISTRY_URL", "ghcr.io"),
                           ("BOOTFLOW_REGISTRY_USER", "ci"),
                           ("BOOTFLOW_REGISTRY_PASSWORD", "pw")]).unwrap();
        assert_eq!(cfg.defaults.registry.map(|r| r.url), Some("ghcr.io".to_string()));
    }

    #[test]
    fn cli_values_override_environment() {
        let cfg = config(&[("BOOTFLOW_ROLE", "agent"), ("BOOTFLOW_GITOPS", "true")]).unwrap();
        let merged = cfg.merge(RoleInput { role: "server".into(),
                                           gitops: Some(false),
                                           ..Default::default() });
        assert_eq!(merged.role, "server");
        assert_eq!(merged.gitops, Some(false));

        let kept = cfg.merge(RoleInput::default());
        assert_eq!(kept.role, "agent");
        assert_eq!(kept.gitops, Some(true));
    }
}
