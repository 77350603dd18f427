use std::error::Error;

use geoserver_catalog::{GeoServer, Layer};

use super::common::{self, found, resolve};

#[derive(Debug, clap::Parser)]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// Show a layer, its store and default style
    Get {
        /// Name of the layer, optionally qualified with its workspace
        name: String,
    },

    /// Publish a resource of a datastore as a layer
    Create {
        /// Workspace of the datastore
        #[clap(short = 'w', long = "workspace")]
        workspace: Option<String>,

        /// Datastore holding the resource, optionally qualified with its workspace
        #[clap(short = 'd', long = "datastore")]
        datastore: String,

        /// Default style of the new layer
        #[clap(short = 's', long = "style")]
        style: Option<String>,

        /// Name of the resource to publish
        name: String,
    },

    /// Change the default style of a layer
    Update {
        /// Name of the layer, optionally qualified with its workspace
        name: String,

        /// New default style
        #[clap(short = 's', long = "style")]
        style: Option<String>,
    },

    /// Delete a layer
    Delete {
        /// Name of the layer, optionally qualified with its workspace
        name: String,
    },
}

async fn get(geoserver: &GeoServer, name: &str) -> Result<Layer, Box<dyn Error>> {
    Ok(found("layer", name, geoserver.get_layer(name).await?)?)
}

pub(crate) async fn command(geoserver: GeoServer, config: Config) -> Result<(), Box<dyn Error>> {
    match config.cmd {
        None => {
            for layer in geoserver.get_layers().await? {
                println!("{}", layer.name());
            }
        }
        Some(SubCommand::Get { name }) => {
            let layer = get(&geoserver, &name).await?;
            println!("name: {}", layer.name());
            println!("workspace: {}", layer.get_workspace().name());
            println!(
                "datastore: {} ({})",
                layer.get_datastore().name(),
                layer.get_datastore().store_type()
            );
            println!("default style: {}", layer.get_default_style().name());
        }
        Some(SubCommand::Create {
            workspace,
            datastore,
            style,
            name,
        }) => {
            let (workspace, store) = resolve(&datastore, workspace.as_deref())?;
            let datastore = geoserver.get_datastore(&store, &workspace).await?;
            let layer = found("datastore", &store, datastore)?
                .create_layer(&name, style.as_deref())
                .await?;
            println!("Layer \"{}\" created", layer.name());
        }
        Some(SubCommand::Update { name, style }) => {
            let Some(style) = style else {
                return Err(common::Error::NothingToUpdate { kind: "layer", name }.into());
            };
            let mut layer = get(&geoserver, &name).await?;
            layer.set_default_style(&style).await?;
            println!("Layer \"{}\" updated", layer.name());
        }
        Some(SubCommand::Delete { name }) => {
            get(&geoserver, &name).await?.delete().await?;
            println!("Layer \"{name}\" deleted");
        }
    }
    Ok(())
}
