//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

/// Media types of the tile formats named by the MBTiles 1.3 spec.
fn tile_media_type(format: &str) -> Option<&'static str> {
    match format {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "pbf" => Some("application/vnd.mapbox-vector-tile"),
        _ => None,
    }
}

/// General extension table for formats outside the MBTiles core set.
fn extension_media_type(format: &str) -> Option<&'static str> {
    match format {
        "mvt" => Some("application/vnd.mapbox-vector-tile"),
        "json" | "geojson" | "topojson" => Some("application/json"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        "ico" => Some("image/x-icon"),
        "txt" => Some("text/plain"),
        "html" => Some("text/html"),
        "xml" => Some("application/xml"),
        _ => None,
    }
}

/// Media type of a declared tile format.
///
/// Lookup order: MBTiles tile formats, then the general extension table.
/// `None` means the caller has to pick its own fallback.
pub fn media_type_for(format: &str) -> Option<&'static str> {
    tile_media_type(format).or_else(|| extension_media_type(format))
}

#[test]
fn test_tile_formats() {
    assert_eq!(media_type_for("png"), Some("image/png"));
    assert_eq!(media_type_for("jpg"), Some("image/jpeg"));
    assert_eq!(media_type_for("jpeg"), Some("image/jpeg"));
    assert_eq!(media_type_for("webp"), Some("image/webp"));
    // full vendor type, not the truncated string some implementations carry
    assert_eq!(
        media_type_for("pbf"),
        Some("application/vnd.mapbox-vector-tile")
    );
}

#[test]
fn test_extension_fallback() {
    assert_eq!(media_type_for("geojson"), Some("application/json"));
    assert_eq!(media_type_for("tiff"), Some("image/tiff"));
    assert_eq!(media_type_for("bin"), None);
    assert_eq!(media_type_for(""), None);
}
