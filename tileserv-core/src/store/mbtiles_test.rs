//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::store::mbtiles::{MbtilesStore, StoreError, TileError};
use rusqlite::{params, Connection};
use std::env;
use std::fs;

/// Create an MBTiles fixture in the temp directory and return its path.
pub(crate) fn create_mbtiles(
    filename: &str,
    metadata: &[(&str, &str)],
    tiles: &[(u8, u32, u32, &[u8])],
) -> String {
    let mut dir = env::temp_dir();
    dir.push("tileserv_test");
    let _ = fs::create_dir_all(&dir);
    dir.push(filename);
    let _ = fs::remove_file(&dir);
    let path = format!("{}", dir.display());

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (name text, value text);
         CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);
         CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);",
    )
    .unwrap();
    for (name, value) in metadata {
        conn.execute(
            "INSERT INTO metadata (name, value) VALUES (?1, ?2)",
            params![name, value],
        )
        .unwrap();
    }
    for (z, x, y, data) in tiles {
        conn.execute(
            "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
            params![z, x, y, data],
        )
        .unwrap();
    }
    path
}

/// Basemap fixture. Tests run in parallel, so every caller gets its own file.
pub(crate) fn basemap_mbtiles(filename: &str) -> String {
    create_mbtiles(
        filename,
        &[
            ("name", "Basemap"),
            ("format", "png"),
            ("bounds", "-180.0,-85.0511,180.0,85.0511"),
            ("center", "0.0,0.0,2"),
            ("minzoom", "0"),
            ("maxzoom", "14"),
        ],
        &[
            (3, 1, 2, b"tile-3-1-2"),
            (3, 1, 3, b"tile-3-1-3"),
            (0, 0, 0, b"tile-0-0-0"),
        ],
    )
}

#[test]
fn test_open_loads_metadata() {
    let path = basemap_mbtiles("basemap_open.mbtiles");
    let store = MbtilesStore::open(&path).unwrap();
    assert_eq!(store.metadata_value("name"), Some("Basemap"));
    assert_eq!(store.format(), Some("png"));
    assert_eq!(store.metadata().len(), 6);
    assert_eq!(
        store.bounds(),
        Some(vec![-180.0, -85.0511, 180.0, 85.0511])
    );
    assert_eq!(store.center(), Some(vec![0.0, 0.0, 2.0]));
    assert_eq!(store.minzoom(), Some(0));
    assert_eq!(store.maxzoom(), Some(14));
    assert_eq!(store.json(), None);
}

#[test]
fn test_open_missing_file() {
    let err = MbtilesStore::open("/no/such/file.mbtiles").err().unwrap();
    assert_eq!(err.to_string(), "no such file '/no/such/file.mbtiles'");
    match err {
        StoreError::FileNotFound(_) => {}
        _ => panic!("expected FileNotFound, got {:?}", err),
    }
}

#[test]
fn test_open_invalid_file() {
    let mut dir = env::temp_dir();
    dir.push("tileserv_test");
    let _ = fs::create_dir_all(&dir);
    dir.push("not_a_db.mbtiles");
    fs::write(&dir, "this is not an SQLite database").unwrap();
    let path = format!("{}", dir.display());

    let err = MbtilesStore::open(&path).err().unwrap();
    match err {
        StoreError::FileNotFound(_) => panic!("file exists, open must fail later"),
        _ => {}
    }
}

#[test]
fn test_open_without_metadata_table() {
    let mut dir = env::temp_dir();
    dir.push("tileserv_test");
    let _ = fs::create_dir_all(&dir);
    dir.push("no_metadata.mbtiles");
    let _ = fs::remove_file(&dir);
    let path = format!("{}", dir.display());
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);")
        .unwrap();
    drop(conn);

    let err = MbtilesStore::open(&path).err().unwrap();
    match err {
        StoreError::InvalidMbtiles(_) => {}
        _ => panic!("expected InvalidMbtiles, got {:?}", err),
    }
}

#[test]
fn test_fetch_tile() {
    let path = basemap_mbtiles("basemap_fetch.mbtiles");
    let store = MbtilesStore::open(&path).unwrap();
    // byte-exact round trip
    assert_eq!(store.fetch_tile(3, 1, 2).unwrap(), b"tile-3-1-2");
    assert_eq!(store.fetch_tile(0, 0, 0).unwrap(), b"tile-0-0-0");
}

#[test]
fn test_fetch_tile_not_found() {
    let path = basemap_mbtiles("basemap_missing.mbtiles");
    let store = MbtilesStore::open(&path).unwrap();
    let err = store.fetch_tile(9, 9, 9).err().unwrap();
    assert_eq!(err.to_string(), "tile z=9 x=9 y=9 not found");
    match err {
        TileError::NotFound { z: 9, x: 9, y: 9 } => {}
        _ => panic!("expected NotFound, got {:?}", err),
    }
}

#[test]
fn test_media_type_fallbacks() {
    let path = create_mbtiles(
        "vector.mbtiles",
        &[
            ("format", "pbf"),
            ("json", r#"{"vector_layers": [{"id": "roads"}]}"#),
        ],
        &[],
    );
    let store = MbtilesStore::open(&path).unwrap();
    assert_eq!(store.media_type(), "application/vnd.mapbox-vector-tile");
    assert_eq!(
        store.json().unwrap()["vector_layers"][0]["id"],
        json!("roads")
    );

    // no format entry: absent is None, media type falls back
    let path = create_mbtiles("noformat.mbtiles", &[("name", "x")], &[]);
    let store = MbtilesStore::open(&path).unwrap();
    assert_eq!(store.format(), None);
    assert_eq!(store.media_type(), "text/plain");

    let path = create_mbtiles("oddformat.mbtiles", &[("format", "foo")], &[]);
    let store = MbtilesStore::open(&path).unwrap();
    assert_eq!(store.media_type(), "text/plain");
}

#[test]
fn test_malformed_optional_metadata() {
    let path = create_mbtiles(
        "badmeta.mbtiles",
        &[
            ("format", "png"),
            ("bounds", "not,numbers,at,all"),
            ("json", "{not json"),
        ],
        &[],
    );
    let store = MbtilesStore::open(&path).unwrap();
    assert_eq!(store.bounds(), None);
    assert_eq!(store.center(), None);
    assert_eq!(store.json(), None);
}

#[test]
fn test_concurrent_fetch() {
    use std::sync::Arc;
    use std::thread;

    let tiles: Vec<(u8, u32, u32, Vec<u8>)> = (0..16u32)
        .map(|i| (5, i, i + 1, format!("blob-{}", i).into_bytes()))
        .collect();
    let tile_refs: Vec<(u8, u32, u32, &[u8])> = tiles
        .iter()
        .map(|(z, x, y, data)| (*z, *x, *y, data.as_slice()))
        .collect();
    let path = create_mbtiles("concurrent.mbtiles", &[("format", "png")], &tile_refs);
    let store = Arc::new(MbtilesStore::open(&path).unwrap());

    let handles: Vec<_> = tiles
        .iter()
        .cloned()
        .map(|(z, x, y, expected)| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    assert_eq!(store.fetch_tile(z, x, y).unwrap(), expected);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
