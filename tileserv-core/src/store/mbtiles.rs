//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::store::media_type::media_type_for;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no such file '{0}'")]
    FileNotFound(String),
    #[error("not a valid MBTiles file: {0}")]
    InvalidMbtiles(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

#[derive(Error, Debug)]
pub enum TileError {
    /// No row for this coordinate. Expected for most of the tile pyramid.
    #[error("tile z={z} x={x} y={y} not found")]
    NotFound { z: u8, x: u32, y: u32 },
    #[error("tile query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Read-only access to a single MBTiles file.
///
/// The metadata table is loaded once at open time and immutable afterwards.
/// Tile queries check a pooled read-only connection out per call, so
/// concurrent readers never share a cursor.
#[derive(Clone)]
pub struct MbtilesStore {
    pub path: String,
    metadata: HashMap<String, String>,
    pool: Pool<SqliteConnectionManager>,
}

impl MbtilesStore {
    /// Open an MBTiles file read-only and load its metadata table.
    ///
    /// Fails if the file is missing, is not an SQLite database or has no
    /// readable metadata table. A tileset that opens is servable.
    pub fn open(path: &str) -> Result<MbtilesStore, StoreError> {
        if !Path::new(path).is_file() {
            return Err(StoreError::FileNotFound(path.to_string()));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        // Load the metadata table over a plain connection before setting up
        // the pool: a file that is no SQLite database or has no metadata
        // table must fail here, not on the first tile request.
        let metadata = {
            let conn = Connection::open_with_flags(path, flags)?;
            let mut stmt = conn.prepare("SELECT name, value FROM metadata")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            rows.collect::<Result<HashMap<_, _>, _>>()?
        };
        let manager = SqliteConnectionManager::file(path).with_flags(flags);
        let pool = Pool::builder().max_size(8).build(manager)?;
        debug!(
            "Opened tileset {} ({} metadata entries)",
            path,
            metadata.len()
        );
        Ok(MbtilesStore {
            path: path.to_string(),
            metadata,
            pool,
        })
    }

    /// Fetch the raw tile blob at the given coordinate.
    ///
    /// Exact-match point query on (zoom_level, tile_column, tile_row).
    /// The blob is returned unmodified.
    pub fn fetch_tile(&self, z: u8, x: u32, y: u32) -> Result<Vec<u8>, TileError> {
        let conn = self.pool.get()?;
        let tile = conn
            .query_row(
                "SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                params![z, x, y],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        tile.ok_or(TileError::NotFound { z, x, y })
    }

    /// All metadata entries.
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Value of a single metadata entry.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|v| v.as_str())
    }

    /// Declared tile format. MBTiles 1.3 requires this entry, but files
    /// without it exist in the wild.
    pub fn format(&self) -> Option<&str> {
        self.metadata_value("format")
    }

    /// Media type of the declared format.
    ///
    /// `text/plain` is a best-effort fallback for unknown formats, not a
    /// guarantee.
    pub fn media_type(&self) -> &'static str {
        let format = self.format().unwrap_or("unknown");
        media_type_for(format).unwrap_or_else(|| {
            debug!(
                "No media type for format '{}' of tileset {}, falling back to text/plain",
                format, self.path
            );
            "text/plain"
        })
    }

    /// `bounds` metadata entry as minx,miny,maxx,maxy.
    pub fn bounds(&self) -> Option<Vec<f64>> {
        self.float_list("bounds")
    }

    /// `center` metadata entry as longitude,latitude,zoom.
    pub fn center(&self) -> Option<Vec<f64>> {
        self.float_list("center")
    }

    pub fn minzoom(&self) -> Option<u8> {
        self.metadata_value("minzoom").and_then(|v| v.parse().ok())
    }

    pub fn maxzoom(&self) -> Option<u8> {
        self.metadata_value("maxzoom").and_then(|v| v.parse().ok())
    }

    /// Nested JSON document of vector tilesets (`json` metadata entry).
    pub fn json(&self) -> Option<serde_json::Value> {
        self.metadata_value("json")
            .and_then(|v| serde_json::from_str(v).ok())
    }

    fn float_list(&self, key: &str) -> Option<Vec<f64>> {
        self.metadata_value(key).and_then(|v| {
            v.split(',')
                .map(|num| num.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .ok()
        })
    }
}
