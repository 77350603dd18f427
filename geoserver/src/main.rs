//! Entrypoint of the geoserver command line client
#![warn(clippy::explicit_iter_loop, clippy::use_self)]

use dotenvy::dotenv;
use trogging::{
    TroggingGuard,
    cli::LoggingConfigBuilderExt,
    tracing_subscriber::{Registry, prelude::*},
};

mod commands {
    pub(crate) mod common;
    pub(crate) mod datastore;
    pub(crate) mod layer;
    pub(crate) mod layergroup;
    pub(crate) mod server;
    pub(crate) mod style;
    pub(crate) mod workspace;
}

enum ReturnCode {
    Failure = 1,
}

#[derive(Debug, clap::Parser)]
#[clap(
    name = "geoserver",
    version,
    about = "Command line client for the GeoServer REST catalog",
    long_about = r#"Command line client for the GeoServer REST catalog

Examples:
    # List all layers
    geoserver layer

    # Create a PostGIS datastore from the libpq environment variables
    geoserver ds create pg -e -s public -w topp roads

    # Toggle two layers in a layer group
    geoserver layergroup update tasmania topp:states sf:roads

    # Talk to another server with debug logging
    LOG_FILTER=debug geoserver --geoserver-url http://gis.example.com/geoserver/rest/ ws
"#
)]
struct Config {
    #[clap(flatten)]
    geoserver_config: commands::common::GeoServerConfig,

    #[clap(flatten)]
    logging_config: trogging::cli::LoggingConfig,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// List, show, create, update or delete workspaces
    Ws(commands::workspace::Config),

    /// List, show, create, update or delete datastores
    Ds(commands::datastore::Config),

    /// List, show, create, update or delete layers
    Layer(commands::layer::Config),

    /// List, show, create, update or delete layer groups
    Layergroup(commands::layergroup::Config),

    /// List, show, create, update or delete styles
    Style(commands::style::Config),

    /// Reload the catalog and configuration from disk
    Reload,

    /// Reset the server's caches and connections
    Reset,

    /// List the fonts available to the server
    Fonts,
}

fn main() -> Result<(), std::io::Error> {
    // load all environment variables from .env before doing anything
    load_dotenv();

    let config: Config = clap::Parser::parse();

    let tokio_runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    tokio_runtime.block_on(async move {
        fn handle_init_logs(r: Result<TroggingGuard, trogging::Error>) -> TroggingGuard {
            match r {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("Initializing logs failed: {e}");
                    std::process::exit(ReturnCode::Failure as _);
                }
            }
        }

        let _tracing_guard = handle_init_logs(init_logs_and_tracing(&config.logging_config));

        let Some(command) = config.command else {
            println!("command required, -h/--help for help");
            return;
        };

        let geoserver = match config.geoserver_config.connect() {
            Ok(geoserver) => geoserver,
            Err(e) => {
                eprintln!("Connecting to GeoServer failed: {e}");
                std::process::exit(ReturnCode::Failure as _)
            }
        };

        match command {
            Command::Ws(config) => {
                if let Err(e) = commands::workspace::command(geoserver, config).await {
                    eprintln!("Ws command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Ds(config) => {
                if let Err(e) = commands::datastore::command(geoserver, config).await {
                    eprintln!("Ds command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Layer(config) => {
                if let Err(e) = commands::layer::command(geoserver, config).await {
                    eprintln!("Layer command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Layergroup(config) => {
                if let Err(e) = commands::layergroup::command(geoserver, config).await {
                    eprintln!("Layergroup command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Style(config) => {
                if let Err(e) = commands::style::command(geoserver, config).await {
                    eprintln!("Style command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Reload => {
                if let Err(e) = commands::server::reload(geoserver).await {
                    eprintln!("Reload command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Reset => {
                if let Err(e) = commands::server::reset(geoserver).await {
                    eprintln!("Reset command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
            Command::Fonts => {
                if let Err(e) = commands::server::fonts(geoserver).await {
                    eprintln!("Fonts command failed: {e}");
                    std::process::exit(ReturnCode::Failure as _)
                }
            }
        }
    });

    Ok(())
}

/// Source the .env file before initialising the Config struct - this sets
/// any envs in the file, which the Config struct then uses.
///
/// Precedence is given to existing env variables.
fn load_dotenv() {
    match dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            // Ignore this - a missing env file is not an error, defaults will
            // be applied when initialising the Config struct.
        }
        Err(e) => {
            eprintln!("FATAL Error loading config from: {e}");
            eprintln!("Aborting");
            std::process::exit(1);
        }
    };
}

fn init_logs_and_tracing(
    config: &trogging::cli::LoggingConfig,
) -> Result<TroggingGuard, trogging::Error> {
    // warn keeps the command output clean unless -v or LOG_FILTER ask for more
    let log_layer = trogging::Builder::new()
        .with_default_log_filter("warn")
        .with_logging_config(config)
        .build()?;

    let subscriber = Registry::default().with(log_layer);
    trogging::install_global(subscriber)
}
