use std::error::Error;

use geoserver_catalog::{GeoServer, Workspace};

use super::common::found;

#[derive(Debug, clap::Parser)]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// Show a workspace and its namespace
    Get {
        /// Name of the workspace
        name: String,
    },

    /// Create a workspace bound to a namespace URI
    Create {
        /// Name of the workspace
        name: String,
        /// Namespace URI of the workspace
        namespace: String,
    },

    /// Change the namespace URI of a workspace
    Update {
        /// Name of the workspace
        name: String,
        /// New namespace URI
        namespace: String,
    },

    /// Delete a workspace
    Delete {
        /// Name of the workspace
        name: String,
    },
}

async fn get(geoserver: &GeoServer, name: &str) -> Result<Workspace, Box<dyn Error>> {
    Ok(found("workspace", name, geoserver.get_workspace(name).await?)?)
}

pub(crate) async fn command(geoserver: GeoServer, config: Config) -> Result<(), Box<dyn Error>> {
    match config.cmd {
        None => {
            for workspace in geoserver.get_workspaces().await? {
                println!("{}", workspace.name());
            }
        }
        Some(SubCommand::Get { name }) => {
            let workspace = get(&geoserver, &name).await?;
            println!("name: {}", workspace.name());
            println!("namespace: {}", workspace.get_namespace().unwrap_or("-"));
        }
        Some(SubCommand::Create { name, namespace }) => {
            let workspace = geoserver.create_workspace(&name, &namespace).await?;
            println!("Workspace \"{}\" created", workspace.name());
        }
        Some(SubCommand::Update { name, namespace }) => {
            let mut workspace = get(&geoserver, &name).await?;
            workspace.set_namespace(&namespace).await?;
            println!("Workspace \"{name}\" updated");
        }
        Some(SubCommand::Delete { name }) => {
            get(&geoserver, &name).await?.delete().await?;
            println!("Workspace \"{name}\" deleted");
        }
    }
    Ok(())
}
