use std::error::Error;

use geoserver_catalog::{
    Datastore, GeoServer, StoreKind, StoreSpec, StoreType, Workspace, params::READ_KEYS,
};

use super::common::{self, PgArgs, found, resolve};

#[derive(Debug, clap::Parser)]
pub(crate) struct Config {
    /// Only list the datastores of this workspace
    #[clap(short = 'w', long = "workspace")]
    workspace: Option<String>,

    #[clap(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// Show a datastore and its connection settings
    Get(Target),

    /// Create a datastore
    Create {
        #[clap(subcommand)]
        store: Create,
    },

    /// Change the connection settings of a datastore
    Update {
        #[clap(subcommand)]
        store: Update,
    },

    /// Delete a datastore
    Delete(Target),
}

#[derive(Debug, clap::Args)]
struct Target {
    /// Name of the datastore, optionally qualified with its workspace
    name: String,

    /// Workspace of the datastore
    #[clap(short = 'w', long = "workspace")]
    workspace: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
enum Create {
    /// Create a PostGIS datastore
    Pg {
        #[clap(flatten)]
        target: Target,
        #[clap(flatten)]
        pg: PgArgs,
        /// Database schema
        #[clap(short = 's', long = "schema")]
        schema: String,
    },

    /// Create a shapefile datastore
    Shp {
        #[clap(flatten)]
        target: Target,
        /// Path of the shapefile or shapefile directory on the server
        #[clap(short = 'f', long = "file")]
        file: String,
    },

    /// Create a GeoTIFF datastore
    Tiff {
        #[clap(flatten)]
        target: Target,
        /// Path of the GeoTIFF on the server
        #[clap(short = 'f', long = "file")]
        file: String,
    },
}

#[derive(Debug, clap::Subcommand)]
enum Update {
    /// Change some of the connection parameters of a PostGIS datastore
    Pg {
        #[clap(flatten)]
        target: Target,
        #[clap(flatten)]
        pg: PgArgs,
        /// Database schema
        #[clap(short = 's', long = "schema")]
        schema: Option<String>,
    },

    /// Point a shapefile datastore at another file
    Shp {
        #[clap(flatten)]
        target: Target,
        #[clap(short = 'f', long = "file")]
        file: String,
    },

    /// Point a GeoTIFF datastore at another file
    Tiff {
        #[clap(flatten)]
        target: Target,
        #[clap(short = 'f', long = "file")]
        file: String,
    },
}

async fn workspace(geoserver: &GeoServer, name: &str) -> Result<Workspace, Box<dyn Error>> {
    Ok(found("workspace", name, geoserver.get_workspace(name).await?)?)
}

async fn get(geoserver: &GeoServer, target: &Target) -> Result<Datastore, Box<dyn Error>> {
    let (workspace, name) = resolve(&target.name, target.workspace.as_deref())?;
    let datastore = geoserver.get_datastore(&name, &workspace).await?;
    Ok(found("datastore", &target.name, datastore)?)
}

/// Fetch the datastore named by `target`, failing unless it is of type `expected`
async fn get_typed(
    geoserver: &GeoServer,
    target: &Target,
    expected: StoreType,
) -> Result<Datastore, Box<dyn Error>> {
    let datastore = get(geoserver, target).await?;
    let actual = datastore.store_type();
    if actual != expected {
        return Err(geoserver_catalog::Error::StoreKind {
            name: datastore.name().to_string(),
            expected: match expected {
                StoreType::Shapefile => "shapefile",
                StoreType::GeoTiff => "GeoTIFF",
                StoreType::PostGis => "PostGIS",
            },
            actual,
        }
        .into());
    }
    Ok(datastore)
}

async fn create(
    geoserver: &GeoServer,
    target: Target,
    spec: StoreSpec,
) -> Result<(), Box<dyn Error>> {
    let (workspace_name, name) = resolve(&target.name, target.workspace.as_deref())?;
    let datastore = workspace(geoserver, &workspace_name)
        .await?
        .create_datastore(&name, spec)
        .await?;
    println!(
        "{} datastore \"{}:{}\" created",
        datastore.store_type(),
        workspace_name,
        datastore.name()
    );
    Ok(())
}

fn print(datastore: &Datastore) {
    println!(
        "name: {}:{}",
        datastore.get_workspace().name(),
        datastore.name()
    );
    println!("type: {}", datastore.store_type());
    match datastore.kind() {
        StoreKind::VectorFile { file } | StoreKind::RasterFile { file } => {
            println!("file: {file}");
        }
        StoreKind::PostGis { params } => {
            for key in READ_KEYS {
                println!("{key}: {}", params.get(key).unwrap_or("-"));
            }
        }
    }
}

pub(crate) async fn command(geoserver: GeoServer, config: Config) -> Result<(), Box<dyn Error>> {
    match config.cmd {
        None => {
            let workspaces = match &config.workspace {
                Some(name) => vec![workspace(&geoserver, name).await?],
                None => geoserver.get_workspaces().await?,
            };
            for workspace in workspaces {
                for datastore in workspace.get_datastores().await? {
                    println!(
                        "{}:{}\t{}",
                        workspace.name(),
                        datastore.name(),
                        datastore.store_type()
                    );
                }
            }
        }
        Some(SubCommand::Get(target)) => print(&get(&geoserver, &target).await?),
        Some(SubCommand::Create { store }) => match store {
            Create::Pg { target, pg, schema } => {
                create(&geoserver, target, StoreSpec::PostGis(pg.params(Some(schema)))).await?
            }
            Create::Shp { target, file } => {
                create(&geoserver, target, StoreSpec::Shapefile(file)).await?
            }
            Create::Tiff { target, file } => {
                create(&geoserver, target, StoreSpec::GeoTiff(file)).await?
            }
        },
        Some(SubCommand::Update { store }) => {
            let (target, datastore) = match store {
                Update::Pg { target, pg, schema } => {
                    let params = pg.params(schema);
                    if params.is_empty() {
                        return Err(common::Error::NothingToUpdate {
                            kind: "datastore",
                            name: target.name,
                        }
                        .into());
                    }
                    let mut datastore = get_typed(&geoserver, &target, StoreType::PostGis).await?;
                    datastore.set_database_params(&params).await?;
                    (target, datastore)
                }
                Update::Shp { target, file } => {
                    let mut datastore =
                        get_typed(&geoserver, &target, StoreType::Shapefile).await?;
                    datastore.set_file(&file).await?;
                    (target, datastore)
                }
                Update::Tiff { target, file } => {
                    let mut datastore = get_typed(&geoserver, &target, StoreType::GeoTiff).await?;
                    datastore.set_file(&file).await?;
                    (target, datastore)
                }
            };
            println!(
                "{} datastore \"{}\" updated",
                datastore.store_type(),
                target.name
            );
        }
        Some(SubCommand::Delete(target)) => {
            get(&geoserver, &target).await?.delete().await?;
            println!("Datastore \"{}\" deleted", target.name);
        }
    }
    Ok(())
}
