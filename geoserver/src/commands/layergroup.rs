use std::error::Error;

use geoserver_catalog::{GeoServer, LayerGroup};

use super::common::found;

#[derive(Debug, clap::Parser)]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// Show the member layers of a layer group
    Get {
        /// Name of the layer group
        name: String,
    },

    /// Create a layer group
    Create {
        /// Workspace to qualify bare layer names with
        #[clap(short = 'w', long = "workspace")]
        workspace: Option<String>,

        /// Name of the layer group
        name: String,

        /// Member layers, in drawing order
        #[clap(required = true)]
        layers: Vec<String>,
    },

    /// Toggle layers in a layer group: members are removed, others appended
    Update {
        /// Name of the layer group
        name: String,

        /// Layers to toggle
        #[clap(required = true)]
        layers: Vec<String>,
    },

    /// Delete a layer group
    Delete {
        /// Name of the layer group
        name: String,
    },
}

async fn get(geoserver: &GeoServer, name: &str) -> Result<LayerGroup, Box<dyn Error>> {
    Ok(found("layer group", name, geoserver.get_layergroup(name).await?)?)
}

pub(crate) async fn command(geoserver: GeoServer, config: Config) -> Result<(), Box<dyn Error>> {
    match config.cmd {
        None => {
            for group in geoserver.get_layergroups().await? {
                println!("{}", group.name());
            }
        }
        Some(SubCommand::Get { name }) => {
            for layer in get(&geoserver, &name).await?.get_layers().await? {
                println!("{}", layer.name());
            }
        }
        Some(SubCommand::Create {
            workspace,
            name,
            layers,
        }) => {
            let group = geoserver
                .create_layergroup(&name, &layers, workspace.as_deref())
                .await?;
            println!("Layer group \"{}\" created", group.name());
        }
        Some(SubCommand::Update { name, layers }) => {
            get(&geoserver, &name).await?.set_layers(&layers).await?;
            println!("Layer group \"{name}\" updated");
        }
        Some(SubCommand::Delete { name }) => {
            get(&geoserver, &name).await?.delete().await?;
            println!("Layer group \"{name}\" deleted");
        }
    }
    Ok(())
}
