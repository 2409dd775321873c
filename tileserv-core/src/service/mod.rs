//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod metadata;
pub mod tile_service;

pub use self::tile_service::{TileResponse, TileService, Tileset};
