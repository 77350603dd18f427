use std::{error::Error, path::PathBuf};

use geoserver_catalog::{GeoServer, Style};

use super::common::found;

#[derive(Debug, clap::Parser)]
pub(crate) struct Config {
    #[clap(subcommand)]
    cmd: Option<SubCommand>,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    /// Print the SLD body of a style
    Get {
        /// Name of the style, optionally qualified with its workspace
        name: String,
    },

    /// Create a style from an SLD file
    Create {
        /// Name of the style
        name: String,

        /// SLD file to upload
        #[clap(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Replace the SLD body of a style
    Update {
        /// Name of the style, optionally qualified with its workspace
        name: String,

        /// SLD file to upload
        #[clap(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Delete a style
    Delete {
        /// Name of the style, optionally qualified with its workspace
        name: String,
    },
}

async fn get(geoserver: &GeoServer, name: &str) -> Result<Style, Box<dyn Error>> {
    Ok(found("style", name, geoserver.get_style(name).await?)?)
}

pub(crate) async fn command(geoserver: GeoServer, config: Config) -> Result<(), Box<dyn Error>> {
    match config.cmd {
        None => {
            for style in geoserver.get_styles().await? {
                println!("{}", style.name());
            }
        }
        Some(SubCommand::Get { name }) => {
            print!("{}", get(&geoserver, &name).await?.get_sld().await?);
        }
        Some(SubCommand::Create { name, file }) => {
            let sld = tokio::fs::read_to_string(&file).await?;
            let style = geoserver.create_style(&name, &sld).await?;
            println!("Style \"{}\" created", style.name());
        }
        Some(SubCommand::Update { name, file }) => {
            let sld = tokio::fs::read_to_string(&file).await?;
            get(&geoserver, &name).await?.set_sld(&sld).await?;
            println!("Style \"{name}\" updated");
        }
        Some(SubCommand::Delete { name }) => {
            get(&geoserver, &name).await?.delete().await?;
            println!("Style \"{name}\" deleted");
        }
    }
    Ok(())
}
