//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

#[macro_use]
extern crate clap;

use clap::{App, ArgMatches, SubCommand};
use dotenv::dotenv;
use env_logger::Builder;
use log::Record;
use std::env;
use std::io::Write;
use tileserv_webserver as webserver;
use time;

fn init_logger(args: &ArgMatches<'_>) {
    let mut builder = Builder::new();
    builder.format(|buf, record: &Record<'_>| {
        let t = time::now();
        writeln!(
            buf,
            "{}.{:03} {} {}",
            time::strftime("%Y-%m-%d %H:%M:%S", &t).unwrap(),
            t.tm_nsec / 1000_000,
            record.level(),
            record.args()
        )
    });

    let rust_log_env = env::var("RUST_LOG");
    let rust_log = if args.value_of("loglevel").is_none() && rust_log_env.is_ok() {
        rust_log_env.as_ref().unwrap()
    } else {
        match args.value_of("loglevel").unwrap_or("info") {
            "debug" => "debug,tokio=info,actix_server=info",
            loglevel => loglevel,
        }
    };
    builder.parse_filters(rust_log);

    builder.init();
}

fn main() {
    dotenv().ok();
    let mut app = App::new("tileserv")
        .version(crate_version!())
        .about("Web server for map tiles stored in MBTiles files")
        .subcommand(
            SubCommand::with_name("serve")
                .args_from_usage(
                    "--tileset=[NAME=FILE]... 'MBTiles tileset to serve (repeatable)'
                     --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'
                     -c, --config=[FILE] 'Load from custom config file'
                     --bind=[IPADDRESS] 'Bind web server to this address (0.0.0.0 for all)'
                     --port=[PORT] 'Bind web server to this port'
                     --openbrowser=[true|false] 'Open backend URL in browser'",
                )
                .about("Start web server and serve tiles from MBTiles files"),
        )
        .subcommand(
            SubCommand::with_name("genconfig")
                .args_from_usage(
                    "--tileset=[NAME=FILE]... 'MBTiles tileset to serve (repeatable)'
                     --loglevel=[error|warn|info|debug|trace] 'Log level (Default: info)'",
                )
                .about("Generate configuration template"),
        );

    match app.get_matches_from_safe_borrow(env::args()) {
        //app.get_matches() prohibits later call of app.print_help()
        Result::Err(e) => {
            println!("{}", e);
        }
        Result::Ok(matches) => match matches.subcommand() {
            ("serve", Some(sub_m)) => {
                init_logger(sub_m);
                let _ = webserver::webserver(sub_m.clone());
            }
            ("genconfig", Some(sub_m)) => {
                init_logger(sub_m);
                println!("{}", webserver::gen_config(sub_m));
            }
            _ => {
                let _ = app.print_help();
                println!("");
            }
        },
    }
}
