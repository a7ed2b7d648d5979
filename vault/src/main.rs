//! vault-env - load AppRole-protected Vault secrets into a process environment.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use vault_env::{
    CredentialSource, HttpConnector, MemoryEnvironment, TlsVerify, VaultConfig, VaultHandler,
};
use vault_env_common::{LogFormat, TracingConfig, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "vault-env", version, about = "Fetch Vault KV secrets with AppRole credentials")]
struct Cli {
    /// Vault server address (defaults to VAULT_ADDR)
    #[arg(long, global = true)]
    addr: Option<String>,

    /// AppRole role id (defaults to role_id)
    #[arg(long, global = true)]
    role_id: Option<String>,

    /// AppRole secret id (defaults to secret_id; prefer the environment)
    #[arg(long, global = true)]
    secret_id: Option<String>,

    /// Do not verify the server certificate
    #[arg(long, global = true, conflicts_with = "ca_bundle")]
    skip_verify: bool,

    /// Verify the server certificate against this PEM bundle
    #[arg(long, global = true)]
    ca_bundle: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: text or json
    #[arg(long, global = true, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch and merge secret paths and print them as JSON
    Read {
        /// Secret paths, read in order
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Run a command with merged secrets added to its environment
    Exec {
        /// Secret path to load (repeatable)
        #[arg(long = "path")]
        paths: Vec<String>,

        /// Config path whose entries are loaded with path references expanded
        #[arg(long)]
        config: Option<String>,

        /// Command and arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

impl Cli {
    fn vault_config(&self) -> anyhow::Result<VaultConfig> {
        let mut credentials = CredentialSource::from_env();
        if let Some(addr) = &self.addr {
            credentials = credentials.with_endpoint(addr.as_str());
        }
        if let Some(role_id) = &self.role_id {
            credentials = credentials.with_role_id(role_id.as_str());
        }
        if let Some(secret_id) = &self.secret_id {
            credentials = credentials.with_secret_id(secret_id.as_str());
        }

        let config = VaultConfig::from_env()?.with_credentials(credentials);
        let verify = if self.skip_verify {
            TlsVerify::Disabled
        } else if let Some(path) = &self.ca_bundle {
            TlsVerify::ca_bundle(path)
        } else {
            config.verify().clone()
        };
        Ok(config.with_verify(verify))
    }
}

async fn read(config: VaultConfig, paths: Vec<String>) -> anyhow::Result<ExitCode> {
    let verify = config.verify().clone();
    let mut handler = VaultHandler::new(config);
    let secrets = handler.fetch_paths(paths, false, verify).await?;

    println!("{}", serde_json::to_string_pretty(&secrets)?);
    Ok(ExitCode::SUCCESS)
}

async fn exec(
    config: VaultConfig,
    paths: Vec<String>,
    config_path: Option<String>,
    command: Vec<String>,
) -> anyhow::Result<ExitCode> {
    let Some((program, args)) = command.split_first() else {
        bail!("no command specified");
    };

    let verify = config.verify().clone();
    let connector = HttpConnector::new(config.http.clone(), config.kv_mount.clone());
    let mut handler =
        VaultHandler::with_parts(config, connector, MemoryEnvironment::from_process());

    if !paths.is_empty() {
        handler.fetch_paths(paths, true, verify.clone()).await?;
    }
    if let Some(config_path) = config_path {
        let mapping = handler
            .fetch_paths(config_path.as_str(), false, verify.clone())
            .await
            .with_context(|| format!("cannot retrieve config path {config_path}"))?;
        handler.expand_config(&mapping, verify).await?;
    }

    info!(program = %program, "Running command with Vault secrets");
    let status = tokio::process::Command::new(program)
        .args(args)
        .env_clear()
        .envs(handler.into_environment())
        .status()
        .await
        .with_context(|| format!("failed to run {program}"))?;

    debug!(?status, "Command exited");
    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map_or(ExitCode::FAILURE, ExitCode::from))
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.vault_config()?;
    match cli.command {
        Command::Read { paths } => read(config, paths).await,
        Command::Exec {
            paths,
            config: config_path,
            command,
        } => exec(config, paths, config_path, command).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let tracing_config = TracingConfig::default()
        .with_log_level(cli.log_level.as_str())
        .with_format(cli.log_format);
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_exec() {
        let cli = Cli::try_parse_from([
            "vault-env",
            "exec",
            "--path",
            "app/db",
            "--path",
            "app/cache",
            "--skip-verify",
            "--",
            "env",
            "-0",
        ])
        .unwrap();

        assert!(cli.skip_verify);
        match cli.command {
            Command::Exec {
                paths,
                config,
                command,
            } => {
                assert_eq!(paths, vec!["app/db", "app/cache"]);
                assert!(config.is_none());
                assert_eq!(command, vec!["env", "-0"]);
            }
            Command::Read { .. } => panic!("expected exec"),
        }
    }

    #[test]
    fn test_cli_rejects_conflicting_verify_flags() {
        let result = Cli::try_parse_from([
            "vault-env",
            "read",
            "app/db",
            "--skip-verify",
            "--ca-bundle",
            "/tmp/ca.pem",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_log_format() {
        let cli = Cli::try_parse_from(["vault-env", "--log-format", "json", "read", "app/db"])
            .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);

        let result = Cli::try_parse_from(["vault-env", "--log-format", "xml", "read", "app/db"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verify_override() {
        let cli = Cli::try_parse_from(["vault-env", "read", "--ca-bundle", "/tmp/ca.pem", "app/db"])
            .unwrap();
        let config = cli.vault_config().unwrap();
        assert_eq!(config.verify(), &TlsVerify::ca_bundle("/tmp/ca.pem"));
    }
}
