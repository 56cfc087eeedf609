use anyhow::Result;
use tvguide_etl::source::tvmao;
use tvguide_etl::{build_source, Config, SourceKind};

/// Print a source's channel lineup, one channel per line.
pub fn list_channels(config: &Config, kind: SourceKind) -> Result<()> {
    let source = build_source(config, kind)?;
    let lineup = source.lineup();

    for name in &lineup {
        match kind {
            SourceKind::Tvmao => match tvmao::find_channel(name) {
                Some(channel) => println!("{name}\t{}/{}", channel.kind, channel.remote_id),
                None => println!("{name}"),
            },
            SourceKind::Erw => println!("{name}"),
        }
    }

    eprintln!("\n{} channels from {}", lineup.len(), source.name());
    Ok(())
}
