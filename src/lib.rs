//! bootflow
//!
//! Librería de la aplicación `bootflow`:
//! - `config`: variables de entorno (.env) → entrada del Role Resolver.
//! - `errors`: errores de configuración y de aplicación con su código de salida.
//! - `app`: cableado entre configuración, catálogo, engine y reporte.
//!
//! El binario (`main.rs`) sólo parsea la CLI y delega en `app`.

pub mod app;
pub mod config;
pub mod errors;
