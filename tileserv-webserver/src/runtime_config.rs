//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::{ApplicationCfg, TilesetCfg, DEFAULT_CONFIG};
use crate::core::{parse_config, read_config, Config};
use crate::service::tile_service::TileService;
use clap::ArgMatches;
use std::path::Path;
use std::process;
use std::str::FromStr;

/// Tileset CLI argument: `NAME=FILE` or a bare MBTiles path (the file stem
/// becomes the tileset name).
fn parse_tileset_arg(spec: &str) -> TilesetCfg {
    match spec.find('=') {
        Some(pos) => TilesetCfg {
            name: spec[..pos].to_string(),
            path: spec[pos + 1..].to_string(),
        },
        None => {
            let name = Path::new(spec)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("tiles")
                .to_string();
            TilesetCfg {
                name,
                path: spec.to_string(),
            }
        }
    }
}

pub fn config_from_args(args: &ArgMatches) -> ApplicationCfg {
    if let Some(cfgpath) = args.value_of("config") {
        info!("Reading configuration from '{}'", cfgpath);
        if args.values_of("tileset").is_some() {
            warn!("Ignoring argument `tileset`");
        }
        let config = read_config(cfgpath).unwrap_or_else(|err| {
            println!("Error reading configuration - {} ", err);
            process::exit(1)
        });
        config
    } else {
        let bind = args.value_of("bind").unwrap_or("127.0.0.1");
        let port =
            u16::from_str(args.value_of("port").unwrap_or("6767")).expect("Invalid port number");
        let mut config: ApplicationCfg = parse_config(DEFAULT_CONFIG.to_string(), "").unwrap();
        config.webserver.bind = Some(bind.to_string());
        config.webserver.port = Some(port);
        if let Some(specs) = args.values_of("tileset") {
            for spec in specs {
                config.tilesets.push(parse_tileset_arg(spec));
            }
        }
        config
    }
}

pub fn service_from_args(config: &ApplicationCfg, args: &ArgMatches) -> TileService {
    if config.tilesets.is_empty() && args.value_of("config").is_none() {
        println!("Either 'config' or 'tileset' is required");
        process::exit(1)
    }
    TileService::from_config(config).unwrap_or_else(|err| {
        println!("Error reading configuration - {} ", err);
        process::exit(1)
    })
}

#[test]
fn test_parse_tileset_arg() {
    let tileset = parse_tileset_arg("osm=/var/lib/mbtiles/osm.mbtiles");
    assert_eq!(tileset.name, "osm");
    assert_eq!(tileset.path, "/var/lib/mbtiles/osm.mbtiles");

    let tileset = parse_tileset_arg("/var/lib/mbtiles/basemap.mbtiles");
    assert_eq!(tileset.name, "basemap");
    assert_eq!(tileset.path, "/var/lib/mbtiles/basemap.mbtiles");
}
