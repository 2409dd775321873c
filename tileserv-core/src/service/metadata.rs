//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::service::tile_service::{TileService, Tileset};
use serde_json;

impl TileService {
    /// Service metadata for backend web application
    pub fn get_service_metadata(&self) -> serde_json::Value {
        let mut tilesets: Vec<&Tileset> = self.tilesets.iter().collect();
        tilesets.sort_by_key(|tileset| tileset.name.clone());
        let tileset_infos: Vec<serde_json::Value> = tilesets
            .iter()
            .map(|tileset| {
                let format = tileset.store.format().unwrap_or("unknown");
                json!({
                    "name": tileset.name,
                    "tileurl": format!("/{}/{{z}}/{{x}}/{{y}}.{}", tileset.name, format),
                    "format": format,
                    "bounds": tileset.store.bounds(),
                })
            })
            .collect();
        json!({ "tilesets": tileset_infos })
    }

    /// TileJSON metadata (https://github.com/mapbox/tilejson-spec)
    pub fn get_tilejson(&self, baseurl: &str, name: &str) -> Option<serde_json::Value> {
        let tileset = self.get_tileset(name)?;
        let store = &tileset.store;
        let format = store.format().unwrap_or("unknown");
        let mut tilejson = json!({
            "tilejson": "2.2.0",
            "id": tileset.name,
            "name": store.metadata_value("name").unwrap_or(tileset.name.as_str()),
            "format": format,
            "scheme": "xyz",
            "tiles": [format!("{}/{}/{{z}}/{{x}}/{{y}}.{}", baseurl, tileset.name, format)],
        });
        let obj = tilejson.as_object_mut().unwrap();
        for key in &["description", "attribution", "version"] {
            if let Some(value) = store.metadata_value(key) {
                obj.insert(key.to_string(), json!(value));
            }
        }
        if let Some(bounds) = store.bounds() {
            obj.insert("bounds".to_string(), json!(bounds));
        }
        if let Some(center) = store.center() {
            obj.insert("center".to_string(), json!(center));
        }
        if let Some(minzoom) = store.minzoom() {
            obj.insert("minzoom".to_string(), json!(minzoom));
        }
        if let Some(maxzoom) = store.maxzoom() {
            obj.insert("maxzoom".to_string(), json!(maxzoom));
        }
        Some(tilejson)
    }

    /// MBTiles metadata.json (https://github.com/mapbox/mbtiles-spec/blob/master/1.3/spec.md)
    pub fn get_mbtiles_metadata(&self, name: &str) -> Option<serde_json::Value> {
        let tileset = self.get_tileset(name)?;
        let mut obj = serde_json::Map::new();
        for (key, value) in tileset.store.metadata() {
            obj.insert(key.clone(), json!(value));
        }
        // inline the nested JSON document of vector tilesets
        if let Some(json_doc) = tileset.store.json() {
            obj.insert("json".to_string(), json_doc);
        }
        Some(serde_json::Value::Object(obj))
    }
}
