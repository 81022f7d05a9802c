//! Role Resolver: valida la entrada cruda y produce un `RoleConfig`.
//!
//! El `RoleConfig` reemplaza las variables de entorno implícitas de los
//! scripts de bootstrap: todo lo que un step necesita saber del nodo viaja
//! explícitamente en este valor.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NAMESPACES, DEFAULT_READINESS_TIMEOUT_SECS, K3S_KUBECONFIG_PATH, MAX_NAMESPACE_LEN};
use crate::errors::BootstrapError;

/// Función del nodo dentro del cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Control plane (k3s server).
    Server,
    /// Worker que se une a un server existente.
    Agent,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Server, Role::Agent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Server => "server",
            Role::Agent => "agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Role::Server),
            "agent" => Ok(Role::Agent),
            _ => Err(BootstrapError::InvalidRole(s.to_string())),
        }
    }
}

/// Componentes opcionales que se activan con toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Herramienta de dashboard en terminal (k9s).
    Dashboard,
    /// Controlador GitOps (ArgoCD).
    GitOps,
}

/// URL y token para unir un agent a un server.
#[derive(Clone, PartialEq, Eq)]
pub struct JoinParameters {
    pub url: String,
    pub token: String,
}

impl fmt::Debug for JoinParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinParameters")
         .field("url", &self.url)
         .field("token", &"<redacted>")
         .finish()
    }
}

/// Credenciales de un registry OCI (login opcional).
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryLogin {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryLogin")
         .field("url", &self.url)
         .field("username", &self.username)
         .field("password", &"<redacted>")
         .finish()
    }
}

/// Entrada cruda, tal como llega de la CLI o del entorno.
#[derive(Debug, Clone, Default)]
pub struct RoleInput {
    pub role: String,
    pub join_url: Option<String>,
    pub join_token: Option<String>,
    pub namespaces: Option<Vec<String>>,
    pub dashboard: Option<bool>,
    pub gitops: Option<bool>,
}

/// Valores por defecto aplicados cuando la entrada no los especifica.
#[derive(Debug, Clone)]
pub struct RoleDefaults {
    pub namespaces: Vec<String>,
    pub dashboard: bool,
    pub gitops: bool,
    pub readiness_timeout: Duration,
    pub registry: Option<RegistryLogin>,
    pub argocd_manifest_url: String,
    pub kubeconfig_path: PathBuf,
}

pub const DEFAULT_ARGOCD_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/argoproj/argo-cd/stable/manifests/install.yaml";

impl Default for RoleDefaults {
    fn default() -> Self {
        Self { namespaces: DEFAULT_NAMESPACES.iter().map(|s| s.to_string()).collect(),
               dashboard: true,
               gitops: true,
               readiness_timeout: Duration::from_secs(DEFAULT_READINESS_TIMEOUT_SECS),
               registry: None,
               argocd_manifest_url: DEFAULT_ARGOCD_MANIFEST_URL.to_string(),
               kubeconfig_path: PathBuf::from(K3S_KUBECONFIG_PATH) }
    }
}

/// Configuración validada de un nodo. Inmutable una vez resuelta.
#[derive(Debug, Clone)]
pub struct RoleConfig {
    pub role: Role,
    pub join: Option<JoinParameters>,
    pub namespaces: Vec<String>,
    pub dashboard: bool,
    pub gitops: bool,
    pub readiness_timeout: Duration,
    pub registry: Option<RegistryLogin>,
    pub argocd_manifest_url: String,
    pub kubeconfig_path: PathBuf,
}

impl RoleConfig {
    pub fn component_enabled(&self, component: Component) -> bool {
        match component {
            Component::Dashboard => self.dashboard,
            Component::GitOps => self.gitops,
        }
    }
}

/// Valida `input` y aplica `defaults`.
///
/// Para `agent` exige URL y token no vacíos. Para `server` los parámetros de
/// unión se descartan.
pub fn resolve_role(input: RoleInput, defaults: &RoleDefaults) -> Result<RoleConfig, BootstrapError> {
    let role: Role = input.role.parse()?;

    let join = match role {
        Role::Agent => {
            let url = non_empty(input.join_url);
            let token = non_empty(input.join_token);
            match (url, token) {
                (Some(url), Some(token)) => Some(JoinParameters { url, token }),
                (url, token) => {
                    let mut missing = Vec::new();
                    if url.is_none() {
                        missing.push("join url");
                    }
                    if token.is_none() {
                        missing.push("join token");
                    }
                    return Err(BootstrapError::MissingJoinParameters { missing });
                }
            }
        }
        Role::Server => {
            if input.join_url.is_some() || input.join_token.is_some() {
                log::warn!("join parameters are ignored for role server");
            }
            None
        }
    };

    let namespaces = normalize_namespaces(input.namespaces.unwrap_or_else(|| defaults.namespaces.clone()))?;

    Ok(RoleConfig { role,
                    join,
                    namespaces,
                    dashboard: input.dashboard.unwrap_or(defaults.dashboard),
                    gitops: input.gitops.unwrap_or(defaults.gitops),
                    readiness_timeout: defaults.readiness_timeout,
                    registry: defaults.registry.clone(),
                    argocd_manifest_url: defaults.argocd_manifest_url.clone(),
                    kubeconfig_path: defaults.kubeconfig_path.clone() })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Recorta, descarta vacíos y duplicados (conserva la primera aparición) y
/// valida cada nombre.
fn normalize_namespaces(raw: Vec<String>) -> Result<Vec<String>, BootstrapError> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for ns in raw {
        let ns = ns.trim();
        if ns.is_empty() || out.iter().any(|seen| seen == ns) {
            continue;
        }
        if !is_dns1123_label(ns) {
            return Err(BootstrapError::InvalidNamespace(ns.to_string()));
        }
        out.push(ns.to_string());
    }
    Ok(out)
}

pub fn is_dns1123_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_NAMESPACE_LEN {
        return false;
    }
    let valid_char = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-';
    bytes.iter().all(valid_char) && bytes[0] != b'-' && bytes[bytes.len() - 1] != b'-'
}
