//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::core::config::ApplicationCfg;
use crate::core::Config;
use crate::store::{MbtilesStore, TileError};
use percent_encoding::percent_decode;

/// Named tileset in the registry.
#[derive(Clone)]
pub struct Tileset {
    pub name: String,
    pub store: MbtilesStore,
}

/// Outcome of one tile request dispatch.
#[derive(Debug)]
pub enum TileResponse {
    Found {
        data: Vec<u8>,
        media_type: &'static str,
    },
    TileMissing,
    FormatMismatch {
        declared: String,
        requested: String,
    },
    UnknownTileset,
}

/// MBTiles tile service.
///
/// Holds the tileset registry. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct TileService {
    pub tilesets: Vec<Tileset>,
}

impl TileService {
    pub(crate) fn get_tileset(&self, name: &str) -> Option<&Tileset> {
        // URL decode tileset names from http requests
        let dec_name = percent_decode(name.as_bytes()).decode_utf8_lossy();
        self.tilesets.iter().find(|t| t.name == dec_name)
    }

    /// Dispatch one tile request against the registry.
    ///
    /// The requested format must match the tileset's declared format
    /// exactly; the declared format is authoritative over the extension
    /// the client picked.
    pub fn serve_tile(&self, name: &str, z: u8, x: u32, y: u32, format: &str) -> TileResponse {
        let tileset = match self.get_tileset(name) {
            Some(tileset) => tileset,
            None => return TileResponse::UnknownTileset,
        };
        let declared = tileset.store.format().unwrap_or("unknown");
        if declared != format {
            return TileResponse::FormatMismatch {
                declared: declared.to_string(),
                requested: format.to_string(),
            };
        }
        match tileset.store.fetch_tile(z, x, y) {
            Ok(data) => TileResponse::Found {
                data,
                media_type: tileset.store.media_type(),
            },
            Err(TileError::NotFound { .. }) => {
                debug!("/{}/{}/{}/{}.{} not found", name, z, x, y, format);
                TileResponse::TileMissing
            }
            Err(err) => {
                error!("Tile query on tileset '{}' failed: {}", name, err);
                TileResponse::TileMissing
            }
        }
    }
}

impl<'a> Config<'a, ApplicationCfg> for TileService {
    fn from_config(config: &ApplicationCfg) -> Result<Self, String> {
        let mut tilesets = Vec::new();
        for tileset_cfg in &config.tilesets {
            match MbtilesStore::open(&tileset_cfg.path) {
                Ok(store) => {
                    info!(
                        "Serving tileset '{}' from {} (format {})",
                        tileset_cfg.name,
                        tileset_cfg.path,
                        store.format().unwrap_or("unknown")
                    );
                    tilesets.push(Tileset {
                        name: tileset_cfg.name.clone(),
                        store,
                    });
                }
                Err(err) => {
                    // Keep serving the other tilesets
                    error!("Can not open tileset '{}': {}", tileset_cfg.name, err);
                }
            }
        }
        Ok(TileService { tilesets })
    }
    fn gen_config() -> String {
        let toml = r#"# tileserv configuration

[service]
viewer = true

[[tileset]]
name = "osm"
path = "/var/lib/mbtiles/osm.mbtiles"
"#;
        toml.to_string()
    }
    fn gen_runtime_config(&self) -> String {
        let mut config = String::from(
            r#"# tileserv configuration

[service]
viewer = true
"#,
        );
        for tileset in &self.tilesets {
            config.push_str(&format!(
                r#"
[[tileset]]
name = "{}"
path = "{}"
"#,
                tileset.name, tileset.store.path
            ));
        }
        config
    }
}
