//! The PostgreSQL image definition and its configuration surface.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use testcontainers::core::wait::LogWaitStrategy;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::{CopyToContainer, Image};

use crate::driver::DEFAULT_DRIVER;
use crate::error::{Error, Result};
use crate::ssl;

pub(crate) const POSTGRES_PORT: ContainerPort = ContainerPort::Tcp(5432);

const DEFAULT_IMAGE_NAME: &str = "postgres";
const DEFAULT_IMAGE_TAG: &str = "16-alpine";
const DEFAULT_DB: &str = "postgres";
const DEFAULT_USER: &str = "postgres";
const DEFAULT_PASSWORD: &str = "postgres";

const INITDB_DIR: &str = "/docker-entrypoint-initdb.d";
const CONFIG_FILE: &str = "/etc/postgresql/postgresql.conf";

// The entrypoint emits this twice: once for the throwaway server that runs the
// init scripts and once for the real one.
const READY_MESSAGE: &str = "database system is ready to accept connections";

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READY_QUERY: &str = "SELECT 1";

/// A configurable PostgreSQL image.
///
/// Builds up the container definition (credentials, init scripts, server
/// configuration, TLS material, readiness probing) and starts it with
/// [`Postgres::run`]. Works with any Postgres-compatible image: TimescaleDB,
/// PostGIS and pgvector images only differ in their reference.
#[derive(Debug, Clone)]
pub struct Postgres {
    name: String,
    tag: String,
    env_vars: BTreeMap<String, String>,
    copy_to_sources: Vec<CopyToContainer>,
    db_name: String,
    user: String,
    password: String,
    driver_name: String,
    custom_config: bool,
    ssl_enabled: bool,
    ordered_scripts: usize,
    ready_query: Option<String>,
    startup_timeout: Duration,
}

impl Default for Postgres {
    fn default() -> Self {
        let mut env_vars = BTreeMap::new();
        env_vars.insert("POSTGRES_DB".to_string(), DEFAULT_DB.to_string());
        env_vars.insert("POSTGRES_USER".to_string(), DEFAULT_USER.to_string());
        env_vars.insert("POSTGRES_PASSWORD".to_string(), DEFAULT_PASSWORD.to_string());

        Self {
            name: DEFAULT_IMAGE_NAME.to_string(),
            tag: DEFAULT_IMAGE_TAG.to_string(),
            env_vars,
            copy_to_sources: Vec::new(),
            db_name: DEFAULT_DB.to_string(),
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            driver_name: DEFAULT_DRIVER.to_string(),
            custom_config: false,
            ssl_enabled: false,
            ordered_scripts: 0,
            ready_query: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

impl Postgres {
    /// Use a different image reference, e.g. `postgis/postgis:12-3.0`. A
    /// reference without a tag means `latest`.
    pub fn with_image(mut self, image: &str) -> Self {
        match image.rsplit_once(':') {
            // a colon inside the last path segment separates the tag; one
            // before a slash belongs to a registry port
            Some((name, tag)) if !tag.contains('/') => {
                self.name = name.to_string();
                self.tag = tag.to_string();
            }
            _ => {
                self.name = image.to_string();
                self.tag = "latest".to_string();
            }
        }
        self
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self.env_vars
            .insert("POSTGRES_DB".to_string(), self.db_name.clone());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self.env_vars
            .insert("POSTGRES_USER".to_string(), self.user.clone());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self.env_vars
            .insert("POSTGRES_PASSWORD".to_string(), self.password.clone());
        self
    }

    /// Copy init scripts into `/docker-entrypoint-initdb.d` under their own
    /// names. The entrypoint runs them in lexical order; use
    /// [`Postgres::with_ordered_init_scripts`] when the given order matters.
    pub fn with_init_scripts(
        mut self,
        scripts: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<Self> {
        for script in scripts {
            let (contents, file_name) = read_init_script(script.as_ref())?;
            self.copy_to_sources
                .push(CopyToContainer::new(contents, format!("{INITDB_DIR}/{file_name}")));
        }
        Ok(self)
    }

    /// Copy init scripts, prefixing each target name with a sequence number
    /// (`000-`, `001-`, ..) so the given order wins over lexical order. The
    /// sequence continues across calls.
    pub fn with_ordered_init_scripts(
        mut self,
        scripts: impl IntoIterator<Item = impl AsRef<Path>>,
    ) -> Result<Self> {
        for script in scripts {
            let (contents, file_name) = read_init_script(script.as_ref())?;
            let target = ordered_target(self.ordered_scripts, &file_name);
            self.ordered_scripts += 1;
            self.copy_to_sources.push(CopyToContainer::new(contents, target));
        }
        Ok(self)
    }

    /// Replace the server configuration with the given `postgresql.conf`.
    ///
    /// The file replaces the image default entirely, so it must re-enable
    /// networking (`listen_addresses = '*'`).
    pub fn with_config_file(mut self, config: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read(config.as_ref())?;
        self.copy_to_sources
            .push(CopyToContainer::new(contents, CONFIG_FILE));
        self.custom_config = true;
        Ok(self)
    }

    /// Enable server-side TLS with the given CA certificate, server
    /// certificate and server key.
    ///
    /// The material is validated eagerly; empty or unreadable paths are an
    /// error. The server only uses it when the configuration enables
    /// `ssl = on` and points at [`crate::SSL_CA_FILE`], [`crate::SSL_CERT_FILE`]
    /// and [`crate::SSL_KEY_FILE`].
    pub fn with_ssl_cert(
        mut self,
        ca: impl AsRef<Path>,
        cert: impl AsRef<Path>,
        key: impl AsRef<Path>,
    ) -> Result<Self> {
        self.copy_to_sources
            .extend(ssl::copy_sources(ca.as_ref(), cert.as_ref(), key.as_ref())?);
        self.ssl_enabled = true;
        Ok(self)
    }

    /// Name the registered SQL driver the snapshot/restore workflow should
    /// connect through. An unregistered name makes the workflow fall back to
    /// in-container `psql`.
    pub fn with_sql_driver(mut self, name: impl Into<String>) -> Self {
        self.driver_name = name.into();
        self
    }

    /// After start, poll the database with `SELECT 1` until it answers.
    pub fn with_sql_ready(self) -> Self {
        self.with_sql_ready_query(DEFAULT_READY_QUERY)
    }

    /// After start, poll the database with the given query until it answers.
    pub fn with_sql_ready_query(mut self, query: impl Into<String>) -> Self {
        self.ready_query = Some(query.into());
        self
    }

    /// Bound for the SQL readiness probe (default 30s).
    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub(crate) fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub(crate) fn ready_query(&self) -> Option<&str> {
        self.ready_query.as_deref()
    }

    pub(crate) fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }

    pub(crate) fn image_ref(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }

    // The stock entrypoint execs any non-`postgres` first argument, which is
    // how the TLS shim gets to run as root before the real boot.
    fn command_line(&self) -> Vec<String> {
        let mut cmd = Vec::new();
        if self.ssl_enabled {
            cmd.push("sh".to_string());
            cmd.push(ssl::SSL_ENTRYPOINT_PATH.to_string());
        }
        if self.ssl_enabled || self.custom_config {
            cmd.push("postgres".to_string());
        }
        if self.custom_config {
            cmd.push("-c".to_string());
            cmd.push(format!("config_file={CONFIG_FILE}"));
        }
        cmd
    }
}

fn ordered_target(index: usize, file_name: &str) -> String {
    format!("{INITDB_DIR}/{index:03}-{file_name}")
}

fn read_init_script(path: &Path) -> Result<(Vec<u8>, String)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InitScript(format!("{} has no file name", path.display())))?
        .to_string();
    let contents = fs::read(path)
        .map_err(|e| Error::InitScript(format!("{}: {e}", path.display())))?;
    Ok((contents, file_name))
}

impl Image for Postgres {
    fn name(&self) -> &str {
        &self.name
    }

    fn tag(&self) -> &str {
        &self.tag
    }

    fn ready_conditions(&self) -> Vec<WaitFor> {
        vec![
            WaitFor::log(LogWaitStrategy::stderr(READY_MESSAGE).with_times(2)),
            WaitFor::seconds(1),
        ]
    }

    fn env_vars(
        &self,
    ) -> impl IntoIterator<Item = (impl Into<Cow<'_, str>>, impl Into<Cow<'_, str>>)> {
        &self.env_vars
    }

    fn copy_to_sources(&self) -> impl IntoIterator<Item = &CopyToContainer> {
        &self.copy_to_sources
    }

    fn cmd(&self) -> impl IntoIterator<Item = impl Into<Cow<'_, str>>> {
        self.command_line()
    }

    fn expose_ports(&self) -> &[ContainerPort] {
        &[POSTGRES_PORT]
    }
}
