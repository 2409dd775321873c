//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

pub mod mbtiles;
pub mod media_type;

pub use self::mbtiles::{MbtilesStore, StoreError, TileError};
pub use self::media_type::media_type_for;

#[cfg(test)]
pub(crate) mod mbtiles_test;
