//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use crate::runtime_config::{config_from_args, service_from_args};
use crate::service::tile_service::{TileResponse, TileService};
use crate::static_files::StaticFiles;
use actix_files as fs;
use actix_web::{
    http::header, middleware, web, App, Error, HttpRequest, HttpResponse, HttpServer,
};
use clap::ArgMatches;
use std::str::FromStr;

lazy_static! {
    static ref STATIC_FILES: StaticFiles = StaticFiles::init();
}

/// Application state shared by all request handlers
struct AppState {
    service: TileService,
    cache_max_age: u32,
}

fn req_baseurl(req: &HttpRequest) -> String {
    let conninfo = req.connection_info();
    format!("{}://{}", conninfo.scheme(), conninfo.host())
}

/// Service metadata for backend web application
async fn service_metadata(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.service.get_service_metadata())
}

/// TileJSON descriptor of one tileset
async fn tileset_tilejson(
    req: HttpRequest,
    state: web::Data<AppState>,
    tileset: web::Path<String>,
) -> HttpResponse {
    match state.service.get_tilejson(&req_baseurl(&req), &tileset) {
        Some(json) => HttpResponse::Ok().json(json),
        None => HttpResponse::NotFound().body(format!("unknown tileset '{}'", tileset)),
    }
}

/// MBTiles metadata of one tileset
async fn tileset_metadata_json(
    state: web::Data<AppState>,
    tileset: web::Path<String>,
) -> HttpResponse {
    match state.service.get_mbtiles_metadata(&tileset) {
        Some(json) => HttpResponse::Ok().json(json),
        None => HttpResponse::NotFound().body(format!("unknown tileset '{}'", tileset)),
    }
}

async fn tile(
    state: web::Data<AppState>,
    params: web::Path<(String, u8, u32, u32, String)>,
) -> Result<HttpResponse, Error> {
    let (tileset, z, x, y, format) = params.into_inner();
    let response = {
        let state = state.clone();
        let tileset = tileset.clone();
        let format = format.clone();
        // SQLite reads are blocking, keep them off the event loop
        web::block(move || state.service.serve_tile(&tileset, z, x, y, &format)).await?
    };
    let resp = match response {
        TileResponse::Found { data, media_type } => HttpResponse::Ok()
            .content_type(media_type)
            .insert_header((
                header::CACHE_CONTROL,
                format!("max-age={}", state.cache_max_age),
            ))
            .body(data),
        TileResponse::FormatMismatch {
            declared,
            requested,
        } => HttpResponse::NotFound().body(format!(
            "Tiles in tileset '{}' are {} not {}",
            tileset, declared, requested
        )),
        TileResponse::TileMissing => HttpResponse::NotFound().body(format!(
            "/{}/{}/{}/{}.{} not found",
            tileset, z, x, y, format
        )),
        TileResponse::UnknownTileset => {
            HttpResponse::NotFound().body(format!("unknown tileset '{}'", tileset))
        }
    };
    Ok(resp)
}

async fn static_file_handler(req: HttpRequest) -> HttpResponse {
    let key = req.path()[1..].to_string();
    if let Some(ref content) = STATIC_FILES.content(None, key) {
        HttpResponse::Ok().content_type(content.1).body(content.0)
    } else {
        HttpResponse::NotFound().finish()
    }
}

fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/index.json", web::get().to(service_metadata))
        .route("/{tileset}.json", web::get().to(tileset_tilejson))
        .route("/{tileset}/metadata.json", web::get().to(tileset_metadata_json))
        .route("/{tileset}/{z}/{x}/{y}.{format}", web::get().to(tile));
}

#[actix_web::main]
pub async fn webserver(args: ArgMatches<'static>) -> std::io::Result<()> {
    let config = config_from_args(&args);
    let host = config.webserver.bind.clone().unwrap_or("127.0.0.1".to_string());
    let port = config.webserver.port.unwrap_or(6767);
    let bind_addr = format!("{}:{}", host, port);
    let workers = config.webserver.threads.unwrap_or(num_cpus::get() as u8) as usize;
    let viewer = config.service.viewer;
    let openbrowser =
        bool::from_str(args.value_of("openbrowser").unwrap_or("true")).unwrap_or(false);

    let service = service_from_args(&config, &args);
    let cache_max_age = config.webserver.cache_control_max_age.unwrap_or(300);
    let static_dirs = config.webserver.static_.clone();

    let state = web::Data::new(AppState {
        service,
        cache_max_age,
    });

    let server = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(register_routes);
        for static_cfg in &static_dirs {
            app = app.service(fs::Files::new(&static_cfg.path, &static_cfg.dir));
        }
        if viewer {
            app = app.default_service(web::route().to(static_file_handler));
        }
        app
    })
    .workers(workers)
    .bind(&bind_addr)?
    .shutdown_timeout(3) // default: 30s
    .run();

    info!("Serving tiles at http://{}", bind_addr);

    if openbrowser && viewer {
        let _res = open::that(format!("http://{}:{}", &host, port));
    }

    server.await
}

pub fn gen_config(args: &ArgMatches) -> String {
    use crate::core::Config;

    let toml = r#"
[webserver]
# Bind address. Use 0.0.0.0 to listen on all adresses.
bind = "127.0.0.1"
port = 6767
threads = 4
#cache_control_max_age = 43200
"#;
    let mut config;
    if args.values_of("tileset").is_some() {
        let service = service_from_args(&config_from_args(args), args);
        config = service.gen_runtime_config();
    } else {
        config = TileService::gen_config();
    }
    config.push_str(toml);
    config
}

#[test]
fn test_gen_config() {
    use crate::core::parse_config;
    use crate::core::Config;

    let args = ArgMatches::new();
    let toml = gen_config(&args);
    println!("{}", toml);
    assert_eq!(Some("# tileserv configuration"), toml.lines().next());

    let config = parse_config(toml, "").unwrap();
    let _service = TileService::from_config(&config).unwrap();
}

/// Tests run in parallel, every caller passes its own fixture filename.
#[cfg(test)]
fn test_state(filename: &str) -> web::Data<AppState> {
    use crate::service::tile_service::Tileset;
    use rusqlite::{params, Connection};
    use std::env;
    use std::fs;
    use tileserv_core::store::MbtilesStore;

    let mut dir = env::temp_dir();
    dir.push("tileserv_webserver_test");
    let _ = fs::create_dir_all(&dir);
    dir.push(filename);
    let _ = fs::remove_file(&dir);
    let path = format!("{}", dir.display());

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (name text, value text);
         CREATE TABLE tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO metadata (name, value) VALUES ('name', 'Basemap'), ('format', 'png')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (3, 1, 2, ?1)",
        params![&b"png-tile-bytes"[..]],
    )
    .unwrap();
    drop(conn);

    let store = MbtilesStore::open(&path).unwrap();
    web::Data::new(AppState {
        service: TileService {
            tilesets: vec![Tileset {
                name: "basemap".to_string(),
                store,
            }],
        },
        cache_max_age: 300,
    })
}

#[actix_web::test]
async fn test_tile_request() {
    use actix_web::test;

    let app =
        test::init_service(App::new().app_data(test_state("e2e_tile.mbtiles")).configure(register_routes)).await;
    let req = test::TestRequest::get().uri("/basemap/3/1/2.png").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        resp.headers().get(header::CACHE_CONTROL).unwrap(),
        "max-age=300"
    );
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"png-tile-bytes");
}

#[actix_web::test]
async fn test_tile_format_mismatch() {
    use actix_web::test;

    let app =
        test::init_service(App::new().app_data(test_state("e2e_mismatch.mbtiles")).configure(register_routes)).await;
    let req = test::TestRequest::get().uri("/basemap/3/1/2.jpg").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"Tiles in tileset 'basemap' are png not jpg");
}

#[actix_web::test]
async fn test_tile_not_found() {
    use actix_web::test;

    let app =
        test::init_service(App::new().app_data(test_state("e2e_missing.mbtiles")).configure(register_routes)).await;
    let req = test::TestRequest::get().uri("/basemap/9/9/9.png").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"/basemap/9/9/9.png not found");
}

#[actix_web::test]
async fn test_unknown_tileset() {
    use actix_web::test;

    let app =
        test::init_service(App::new().app_data(test_state("e2e_unknown.mbtiles")).configure(register_routes)).await;
    let req = test::TestRequest::get().uri("/nosuch/0/0/0.png").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"unknown tileset 'nosuch'");
}

#[actix_web::test]
async fn test_metadata_endpoints() {
    use actix_web::test;

    let app =
        test::init_service(App::new().app_data(test_state("e2e_metadata.mbtiles")).configure(register_routes)).await;

    let req = test::TestRequest::get().uri("/index.json").to_request();
    let meta: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(meta["tilesets"][0]["name"], "basemap");
    assert_eq!(meta["tilesets"][0]["tileurl"], "/basemap/{z}/{x}/{y}.png");

    let req = test::TestRequest::get().uri("/basemap.json").to_request();
    let tilejson: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(tilejson["name"], "Basemap");
    assert_eq!(tilejson["format"], "png");

    let req = test::TestRequest::get()
        .uri("/basemap/metadata.json")
        .to_request();
    let metadata: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(metadata["format"], "png");

    let req = test::TestRequest::get().uri("/nosuch.json").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
}

#[test]
fn test_static_files() {
    let content = STATIC_FILES.content(None, "".to_string()).unwrap();
    assert_eq!(content.1, "text/html");
    let content = STATIC_FILES.content(None, "index.html".to_string()).unwrap();
    assert!(String::from_utf8_lossy(content.0).contains("tileserv"));
    assert!(STATIC_FILES.content(None, "nosuch.js".to_string()).is_none());
}
