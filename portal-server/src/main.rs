//! HTTP API for the Client Mapping Portal and Platform Entity Designer.
//!
//! portal-core holds the rendering and document-merge logic; this crate
//! only routes requests, validates input, and owns the two side-effecting
//! collaborators: the external dbt project's file tree and the git
//! publisher. Documents are read fresh on every request; the state the
//! server holds between requests is just paths, locks, and the publisher.

use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::{format_err, Error};
use dotenv::dotenv;
use log::*;
use structopt::StructOpt;

use portal_server::app::{config_app, AppState, ProjectLayout};
use portal_server::publish::{GitPublisher, NoopPublisher, Publisher};

#[actix_web::main]
async fn main() -> Result<(), Error> {
    pretty_env_logger::init();
    dotenv().ok();
    let opt = Opt::from_args();

    // debug is boolean, but env var is Result.
    // cli opt overrides env var if env_var is false
    let env_var_debug = env::var("PORTAL_DEBUG")
        .map_err(|_| format_err!(""))
        .and_then(|d| {
            d.parse::<bool>()
                .map_err(|_| format_err!("could not parse bool from env_var PORTAL_DEBUG"))
        });
    let debug = if !opt.debug {
        env_var_debug.unwrap_or(false)
    } else {
        opt.debug // true
    };

    // address
    let server_addr = opt
        .address
        .or_else(|| env::var("PORTAL_ADDR").ok())
        .unwrap_or_else(|| "127.0.0.1:3001".to_owned());

    // external dbt project
    let project_path = opt
        .project_path
        .or_else(|| env::var("PORTAL_PROJECT_PATH").ok().map(PathBuf::from))
        .ok_or_else(|| {
            format_err!("project path not found; either PORTAL_PROJECT_PATH or cli option required")
        })?;
    let layout = ProjectLayout::new(&project_path);

    let git_remote = env::var("PORTAL_GIT_REMOTE").unwrap_or_else(|_| "origin".to_owned());
    let git_branch = env::var("PORTAL_GIT_BRANCH").unwrap_or_else(|_| "main".to_owned());

    let publisher: Box<dyn Publisher> = if opt.no_publish {
        Box::new(NoopPublisher)
    } else {
        Box::new(GitPublisher::new(&project_path, git_remote, git_branch))
    };

    let state = web::Data::new(AppState {
        debug,
        layout,
        publisher,
        mappings_lock: Mutex::new(()),
        schema_lock: Mutex::new(()),
    });

    info!("Portal listening on:     {}", server_addr);
    info!("Portal project path:     {}", project_path.display());
    if opt.no_publish {
        info!("Portal git publish: OFF");
    }
    if debug {
        info!("Portal debug mode: ON");
    }

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(config_app)
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}

/// CLI arguments helper.
#[derive(Debug, StructOpt)]
#[structopt(name = "portal-server")]
struct Opt {
    #[structopt(short = "a", long = "addr")]
    address: Option<String>,

    #[structopt(long = "project-path", parse(from_os_str))]
    project_path: Option<PathBuf>,

    #[structopt(long = "debug")]
    debug: bool,

    /// Skip git add/commit/push after writes.
    #[structopt(long = "no-publish")]
    no_publish: bool,
}
