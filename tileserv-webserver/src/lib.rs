//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

use tileserv_core::{core, service};

pub mod runtime_config;
pub mod server;
mod static_files;

pub use crate::runtime_config::{config_from_args, service_from_args};
pub use crate::server::{gen_config, webserver};
