use anyhow::{Context, Result};
use tvguide_core::Endpoints;
use tvguide_etl::Config;

/// Print the public guide URL, or a channel's logo URL.
pub fn show_url(config: &Config, logo: Option<&str>) -> Result<()> {
    let endpoints = Endpoints::new(&config.public_base_url)
        .with_context(|| format!("Invalid public_base_url: {}", config.public_base_url))?;

    let url = match logo {
        Some(name) => endpoints.logo_url(name)?,
        None => endpoints.guide_url()?,
    };
    println!("{url}");
    Ok(())
}
