//! Constantes del motor de bootstrap.
//!
//! `ENGINE_VERSION` participa en el hash del plan y en el fingerprint de cada
//! corrida: cambiarla invalida la comparación entre reportes de versiones
//! distintas aunque el catálogo de steps no cambie.

/// Versión lógica del motor. Mantener estable mientras no haya cambios
/// incompatibles en la semántica de ejecución.
pub const ENGINE_VERSION: &str = "B1.0";

/// Namespaces creados cuando el llamador no especifica ninguno.
pub const DEFAULT_NAMESPACES: &[&str] = &["argocd", "apps", "monitoring"];

/// Límite por defecto para las esperas de readiness (nodos, deployments).
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 300;

/// Ruta donde k3s escribe su kubeconfig.
pub const K3S_KUBECONFIG_PATH: &str = "/etc/rancher/k3s/k3s.yaml";

/// Longitud máxima de una etiqueta DNS-1123 (nombre de namespace).
pub const MAX_NAMESPACE_LEN: usize = 63;

/// Códigos de salida del proceso.
pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL_STEP: i32 = 1;
pub const EXIT_INVALID_INPUT: i32 = 2;
pub const EXIT_REGISTRY: i32 = 3;
pub const EXIT_ABORTED: i32 = 130;
