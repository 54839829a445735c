//! The hospital CLI application.
//!
//! Wires configuration into the transport stack and router, installs
//! logging, and dispatches parsed commands to their handlers.

use crate::cli::{BaseCommand, CliArgs};
use crate::config::HospitalConfig;
use crate::config_handlers;
use crate::handlers::{self, HospitalChanges};
use anyhow::Result;
use hospital_core::{
    AuthorityGate, EntityTransport, History, Hospital, HttpTransport, PageRequest,
    RetryTransport, RouteTable, Router,
};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// HospitalCli
// ============================================================================

/// The CLI application: a loaded configuration plus version metadata.
pub struct HospitalCli {
    config: HospitalConfig,
    config_path: Option<String>,
    version: String,
}

impl HospitalCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = HospitalConfig::load(args.config.as_deref())?;
        Ok(Self::new(config).with_config_path(args.config.clone()))
    }

    /// Create an application around an already loaded configuration.
    pub fn new(config: HospitalConfig) -> Self {
        Self {
            config,
            config_path: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Remember the explicit `--config` path for the config subcommands.
    pub fn with_config_path(mut self, path: Option<String>) -> Self {
        self.config_path = path;
        self
    }

    /// The effective configuration.
    pub fn config(&self) -> &HospitalConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// `RUST_LOG` wins when set; otherwise `--quiet` means warn, `--verbose`
    /// means debug, and the default is info. Logs go to stderr so command
    /// output on stdout stays machine-readable.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// The route table for hospitals under the configured application name.
    pub fn routes(&self) -> RouteTable {
        RouteTable::for_entity::<Hospital>(&self.config.app_name)
    }

    /// HTTP transport with the configured timeout and token, wrapped in the
    /// read retry policy.
    pub fn transport(&self) -> Result<Arc<dyn EntityTransport<Hospital>>> {
        let api = &self.config.api;
        let mut http = HttpTransport::<Hospital>::with_timeout(
            &api.base_url,
            self.config.app_name.clone(),
            api.timeout(),
        )?;
        if let Some(token) = &api.token {
            http = http.with_token(token.clone());
        }

        let retry = &self.config.retry;
        let transport = RetryTransport::<Hospital>::new(Arc::new(http))
            .with_max_attempts(retry.max_attempts)
            .with_initial_delay(retry.initial_delay())
            .with_max_delay(retry.max_delay());
        Ok(Arc::new(transport))
    }

    /// Router over `transport` with the configured authorities and fallback.
    pub fn router(&self, transport: Arc<dyn EntityTransport<Hospital>>) -> Router<Hospital> {
        let gate = AuthorityGate::new(self.config.routes.authorities.iter().cloned());
        Router::new(self.routes(), Arc::new(gate), transport, Arc::new(History::new()))
            .with_fallback(self.config.routes.fallback)
    }

    /// Run the CLI with the given arguments, writing command output to stdout.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        Self::init_logging(args.verbose, args.quiet);
        let mut stdout = std::io::stdout();

        match args.command {
            Some(command) if is_entity_command(&command) => {
                debug!(base_url = %self.config.api.base_url, "connecting");
                let router = self.router(self.transport()?);
                self.dispatch(&router, command, &mut stdout).await
            }
            Some(command) => self.dispatch_local(command, &mut stdout),
            None => {
                writeln!(stdout, "hospital {}; use --help for usage", self.version)?;
                Ok(())
            }
        }
    }

    /// Run an entity command against `router`.
    pub async fn dispatch(
        &self,
        router: &Router<Hospital>,
        command: BaseCommand,
        out: &mut impl Write,
    ) -> Result<()> {
        match command {
            BaseCommand::List { page, size, sort } => {
                handlers::handle_list(router, handlers::page_request(page, size, sort), out).await
            }
            BaseCommand::Search { query, page, size } => {
                let request = PageRequest::page(page).with_size(size);
                handlers::handle_search(router, &query, request, out).await
            }
            BaseCommand::View { id } => handlers::handle_view(router, &id, out).await,
            BaseCommand::New {
                name,
                address,
                phone,
            } => {
                let changes = HospitalChanges {
                    name: Some(name),
                    address,
                    phone,
                };
                handlers::handle_new(router, changes, out).await
            }
            BaseCommand::Edit {
                id,
                name,
                address,
                phone,
            } => {
                let changes = HospitalChanges {
                    name,
                    address,
                    phone,
                };
                handlers::handle_edit(router, &id, changes, out).await
            }
            BaseCommand::Delete { id, yes } => handlers::handle_delete(router, &id, yes, out).await,
            other => self.dispatch_local(other, out),
        }
    }

    /// Run a command that needs no backend.
    fn dispatch_local(&self, command: BaseCommand, out: &mut impl Write) -> Result<()> {
        match command {
            BaseCommand::Routes => handlers::handle_routes(&self.routes(), out),
            BaseCommand::Version => {
                writeln!(out, "hospital {}", self.version)?;
                Ok(())
            }
            BaseCommand::Config(config_cmd) => Ok(config_handlers::handle_config_command(
                self.config_path.as_deref(),
                config_cmd.command,
                out,
            )?),
            other => anyhow::bail!("{other:?} needs a backend"),
        }
    }
}

fn is_entity_command(command: &BaseCommand) -> bool {
    matches!(
        command,
        BaseCommand::List { .. }
            | BaseCommand::Search { .. }
            | BaseCommand::View { .. }
            | BaseCommand::New { .. }
            | BaseCommand::Edit { .. }
            | BaseCommand::Delete { .. }
    )
}

// ============================================================================
// Tests
// ============================================================================
