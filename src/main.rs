//! ocsp-responder - RFC 6960 OCSP responder

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ocsp_responder::api::{create_router, AppState};
use ocsp_responder::config::{DbConfig, ResponderConfig};
use ocsp_responder::index::{FileStore, IndexStore, SqlStore};
use ocsp_responder::ocsp::NonceTracker;
use ocsp_responder::pki::{CaCertificate, ResponderIdentity};
use ocsp_responder::server;

#[derive(Parser, Debug)]
#[command(name = "ocsp-responder")]
#[command(about = "RFC 6960 OCSP responder backed by an OpenSSL index file or MySQL")]
struct Args {
    /// CA index filename
    #[arg(long, env = "OCSP_INDEX", default_value = "index.txt")]
    index: String,

    /// CA certificate filename
    #[arg(long, env = "OCSP_CACERT", default_value = "ca.crt")]
    cacert: String,

    /// Responder certificate filename
    #[arg(long, env = "OCSP_RESPCERT", default_value = "responder.crt")]
    rcert: String,

    /// Responder key filename (PKCS#8 PEM)
    #[arg(long, env = "OCSP_RESPKEY", default_value = "responder.key")]
    rkey: String,

    /// File to log to
    #[arg(long, env = "OCSP_LOGFILE", default_value = "/var/log/gocsp-responder.log")]
    logfile: String,

    /// Bind address
    #[arg(long, env = "OCSP_ADDRESS", default_value = "0.0.0.0")]
    bind: String,

    /// Listening port
    #[arg(long, env = "OCSP_PORT", default_value = "8888")]
    port: u16,

    /// Serve HTTPS using the responder certificate and key
    #[arg(long, env = "OCSP_SSL")]
    ssl: bool,

    /// Require the OCSP request Content-Type header
    #[arg(long, env = "OCSP_STRICT")]
    strict: bool,

    /// Log to stdout, not the log file
    #[arg(long, env = "OCSP_LOGTOSTDOUT")]
    stdout: bool,

    /// Use MySQL instead of the textfile index
    #[arg(long, env = "OCSP_MYSQL")]
    mysql: bool,

    /// Database user
    #[arg(long = "db-user", env = "OCSP_DB_USER", default_value = "")]
    db_user: String,

    /// Database password
    #[arg(long = "db-pass", env = "OCSP_DB_PASS", default_value = "")]
    db_pass: String,

    /// Database connection protocol (tcp or unix)
    #[arg(long = "db-protocol", env = "OCSP_DB_PROTOCOL", default_value = "tcp")]
    db_protocol: String,

    /// Database address
    #[arg(long = "db-address", env = "OCSP_DB_ADDRESS", default_value = "127.0.0.1:3306")]
    db_address: String,

    /// Database name
    #[arg(long = "db-name", env = "OCSP_DB_NAME", default_value = "")]
    db_name: String,

    /// Print configuration at startup
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> (ResponderConfig, bool) {
        let database = self.mysql.then(|| DbConfig {
            user: self.db_user,
            password: self.db_pass,
            protocol: self.db_protocol,
            address: self.db_address,
            name: self.db_name,
        });
        (
            ResponderConfig {
                index_file: self.index,
                ca_cert_file: self.cacert,
                resp_cert_file: self.rcert,
                resp_key_file: self.rkey,
                log_file: self.logfile,
                bind_address: self.bind,
                port: self.port,
                ssl: self.ssl,
                strict: self.strict,
                log_to_stdout: self.stdout,
                database,
            },
            self.verbose,
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, verbose) = Args::parse().into_config();

    // Initialize logging; a log file that cannot be opened is fatal
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_to_stdout {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("could not open log file {}", config.log_file))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(log_file)),
            )
            .init();
    }

    if verbose {
        config.log();
    }

    // Wire the index backend
    let index: Arc<dyn IndexStore> = match &config.database {
        Some(db) => Arc::new(
            SqlStore::connect(db)
                .await
                .context("index database connection failed")?,
        ),
        None => Arc::new(FileStore::new(&config.index_file)),
    };

    // Certificates and key stay in memory for the process lifetime
    let ca = CaCertificate::load(&config.ca_cert_file)?;
    let responder = ResponderIdentity::load(&config.resp_cert_file, &config.resp_key_file)?;

    let state = Arc::new(AppState {
        ca,
        responder,
        index,
        nonces: NonceTracker::default(),
        strict: config.strict,
    });
    let app = create_router(state);

    let listen_on = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&listen_on)
        .await
        .with_context(|| format!("could not bind {listen_on}"))?;
    tracing::info!("OCSP responder starting on {listen_on} with SSL:{}", config.ssl);

    if config.ssl {
        let acceptor = server::tls_acceptor(
            Path::new(&config.resp_cert_file),
            Path::new(&config.resp_key_file),
        )?;
        server::serve_tls(listener, app, acceptor).await?;
    } else {
        server::serve_plain(listener, app).await?;
    }

    tracing::info!("server shutdown complete");
    Ok(())
}
