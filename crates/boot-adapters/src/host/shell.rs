//! Host real: cada probe o acción es un proceso hijo.
//!
//! Los scripts de los proveedores se invocan tal cual (`curl | sh`); este
//! módulo sólo arma la línea de comandos y traduce el código de salida.
//!
//! Cada hijo corre en su propio grupo de procesos: un Ctrl-C en la terminal
//! llega sólo a `bootflow`, que lo traduce en `AbortSignal` y deja terminar
//! el step en curso.

use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use boot_core::{ClusterClient, HostCommand, InstallScript, Installer, ReleaseAsset, StepApplyError, SystemProbe, WaitCondition};

const DEFAULT_INSTALL_DIR: &str = "/usr/local/bin";

/// Mensaje de `kubectl wait` cuando vence `--timeout`.
const KUBECTL_TIMEOUT_MARKER: &str = "timed out waiting for the condition";

#[derive(Debug, Clone)]
pub struct ShellHost {
    install_dir: PathBuf,
    kubeconfig: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl Default for ShellHost {
    fn default() -> Self {
        Self { install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
               kubeconfig: None,
               search_path: None }
    }
}

impl ShellHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directorio donde se dejan los binarios de releases.
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    /// Kubeconfig usado por las invocaciones de `kubectl`.
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    /// Reemplaza `$PATH` para la búsqueda de binarios y para los hijos.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Comando fuera del grupo de procesos de `bootflow`, con el `$PATH` configurado.
    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        if let Some(path) = &self.search_path {
            cmd.env("PATH", path);
        }
        detach_process_group(&mut cmd);
        cmd
    }

    fn kubectl(&self) -> Command {
        let mut cmd = self.command("kubectl");
        if let Some(path) = &self.kubeconfig {
            cmd.env("KUBECONFIG", path);
        }
        cmd
    }

    /// `true` si el comando termina con 0; `false` si falla o si el programa no existe.
    fn succeeds(&self, cmd: &mut Command) -> Result<bool, StepApplyError> {
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        match cmd.status() {
            Ok(status) => Ok(status.success()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn wait_args(condition: &WaitCondition, timeout: Duration) -> Vec<String> {
        let timeout = format!("--timeout={}s", timeout.as_secs().max(1));
        match condition {
            WaitCondition::NodesReady => vec!["wait".into(), "--for=condition=Ready".into(), "nodes".into(), "--all".into(), timeout],
            WaitCondition::DeploymentsAvailable { namespace } => vec!["-n".into(),
                                                                      namespace.clone(),
                                                                      "wait".into(),
                                                                      "--for=condition=Available".into(),
                                                                      "deployment".into(),
                                                                      "--all".into(),
                                                                      timeout],
        }
    }
}

/// Ejecuta `cmd`, opcionalmente escribiendo `stdin`, y exige código 0.
fn exec(cmd: &mut Command, stdin: Option<&str>) -> Result<Output, StepApplyError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    log::debug!("exec {program} {}", args.join(" "));

    cmd.stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
       .stdout(Stdio::piped())
       .stderr(Stdio::piped());
    let mut child = cmd.spawn()?;
    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes())?;
    }
    let output = child.wait_with_output()?;
    if output.status.success() {
        Ok(output)
    } else {
        Err(StepApplyError::CommandFailed { program,
                                            code: output.status.code(),
                                            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string() })
    }
}

#[cfg(unix)]
fn detach_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn detach_process_group(_cmd: &mut Command) {}

/// `kubectl wait` vencido frente a cualquier otro fallo de kubectl.
fn classify_wait_failure(err: StepApplyError, condition: &WaitCondition, timeout: Duration) -> StepApplyError {
    match err {
        StepApplyError::CommandFailed { ref stderr, .. } if stderr.contains(KUBECTL_TIMEOUT_MARKER) => {
            StepApplyError::Timeout { what: condition.key(),
                                      secs: timeout.as_secs() }
        }
        other => other,
    }
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), StepApplyError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), StepApplyError> {
    Ok(())
}

impl SystemProbe for ShellHost {
    fn has_binary(&self, name: &str) -> Result<bool, StepApplyError> {
        let path = self.search_path.clone().or_else(|| std::env::var_os("PATH")).unwrap_or_default();
        Ok(std::env::split_paths(&path).any(|dir| dir.join(name).is_file()))
    }

    fn has_file(&self, path: &Path) -> Result<bool, StepApplyError> {
        Ok(path.try_exists()?)
    }

    fn service_active(&self, unit: &str) -> Result<bool, StepApplyError> {
        self.succeeds(self.command("systemctl").args(["is-active", "--quiet", unit]))
    }

    fn has_namespace(&self, namespace: &str) -> Result<bool, StepApplyError> {
        self.succeeds(self.kubectl().args(["get", "namespace", namespace]))
    }

    fn has_deployment(&self, namespace: &str, name: &str) -> Result<bool, StepApplyError> {
        self.succeeds(self.kubectl().args(["-n", namespace, "get", "deployment", name]))
    }

    fn condition_met(&self, condition: &WaitCondition) -> Result<bool, StepApplyError> {
        self.succeeds(self.kubectl().args(Self::wait_args(condition, Duration::from_secs(1))))
    }
}

impl Installer for ShellHost {
    fn run_script(&self, script: &InstallScript) -> Result<(), StepApplyError> {
        let args: Vec<String> = script.args.iter().map(|a| sh_quote(a)).collect();
        let line = format!("curl -sfL {} | sh -s - {}", sh_quote(&script.url), args.join(" "));
        log::info!("running installer for {} ({})", script.name, script.url);
        let mut cmd = self.command("sh");
        cmd.arg("-c").arg(line.trim_end());
        for (k, v) in &script.env {
            cmd.env(k, v);
        }
        exec(&mut cmd, None).map(|_| ())
    }

    fn install_release(&self, asset: &ReleaseAsset) -> Result<(), StepApplyError> {
        fs::create_dir_all(&self.install_dir)?;
        let target = self.install_dir.join(&asset.binary);
        log::info!("installing {} into {}", asset.binary, self.install_dir.display());
        if asset.archive {
            let line = format!("curl -sfL {} | tar -xzf - -C {} {}",
                               sh_quote(&asset.url),
                               sh_quote(&self.install_dir.to_string_lossy()),
                               sh_quote(&asset.binary));
            exec(self.command("sh").arg("-c").arg(line), None)?;
        } else {
            exec(self.command("curl").arg("-sfL").arg("-o").arg(&target).arg(&asset.url), None)?;
        }
        set_mode(&target, 0o755)
    }

    fn install_file(&self, from: &Path, to: &Path) -> Result<(), StepApplyError> {
        if from == to {
            return Ok(());
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
        set_mode(to, 0o600)
    }

    fn run_command(&self, command: &HostCommand) -> Result<(), StepApplyError> {
        exec(self.command(&command.program).args(&command.args), command.stdin.as_deref()).map(|_| ())
    }
}

impl ClusterClient for ShellHost {
    fn create_namespace(&self, namespace: &str) -> Result<(), StepApplyError> {
        if self.has_namespace(namespace)? {
            return Ok(());
        }
        exec(self.kubectl().args(["create", "namespace", namespace]), None).map(|_| ())
    }

    fn apply_manifest(&self, namespace: &str, manifest_url: &str) -> Result<(), StepApplyError> {
        exec(self.kubectl().args(["apply", "-n", namespace, "-f", manifest_url]), None).map(|_| ())
    }

    fn wait_for(&self, condition: &WaitCondition, timeout: Duration) -> Result<(), StepApplyError> {
        exec(self.kubectl().args(Self::wait_args(condition, timeout)), None)
            .map(|_| ())
            .map_err(|e| classify_wait_failure(e, condition, timeout))
    }
}
