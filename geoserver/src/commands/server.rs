use std::error::Error;

use geoserver_catalog::GeoServer;

pub(crate) async fn reload(geoserver: GeoServer) -> Result<(), Box<dyn Error>> {
    geoserver.reload().await?;
    println!("GeoServer reload success.");
    Ok(())
}

pub(crate) async fn reset(geoserver: GeoServer) -> Result<(), Box<dyn Error>> {
    geoserver.reset().await?;
    println!("GeoServer reset success.");
    Ok(())
}

pub(crate) async fn fonts(geoserver: GeoServer) -> Result<(), Box<dyn Error>> {
    for font in geoserver.fonts().await? {
        println!("{font}");
    }
    Ok(())
}
