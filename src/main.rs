//! Binary entry point. Settings and logging come up first; then the command
//! line picks either a maintenance command or the TUI at a starting route.
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;
use memorial_manager::auth::Authenticator;
use memorial_manager::catalog::{CatalogWorker, Mp3QuranClient};
use memorial_manager::config::Settings;
use memorial_manager::logging::init_file_logging;
use memorial_manager::routes::{discover_routes, render_sitemap, DiscoveryOptions, Route};
use memorial_manager::{
    ensure_schema, find_user_by_email, grant_role, load_or_seed_persons, revoke_role, run_app,
    App, Role,
};

/// Routing source scanned by `routes` and `sitemap` when no file is given.
const ROUTE_SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/routes.rs");

const USAGE: &str = "usage:
  memorial-manager [PATH]            open the TUI at PATH (default /)
  memorial-manager routes [FILE]     list static routes declared in FILE
  memorial-manager sitemap [HOST]    print a sitemap for HOST
  memorial-manager grant-admin EMAIL give an account the admin role
  memorial-manager revoke-admin EMAIL take the admin role away";

fn main() -> Result<()> {
    let settings = Settings::load()?;
    match settings.log_file() {
        Ok(path) => {
            if let Err(err) = init_file_logging(&path, &settings.log_level) {
                eprintln!("logging disabled: {err:#}");
            }
        }
        Err(err) => eprintln!("logging disabled: {err:#}"),
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let arg = |idx: usize| args.get(idx).map(String::as_str);

    match arg(0) {
        Some("routes") => print_routes(arg(1)),
        Some("sitemap") => print_sitemap(&settings, arg(1)),
        Some("grant-admin") => set_admin(&settings, arg(1), true),
        Some("revoke-admin") => set_admin(&settings, arg(1), false),
        Some("-h") | Some("--help") => {
            println!("{USAGE}");
            Ok(())
        }
        path => run_tui(&settings, path.unwrap_or("/")),
    }
}

/// Seed the store, spawn the catalog worker and hand the terminal to the UI.
fn run_tui(settings: &Settings, path: &str) -> Result<()> {
    let conn = ensure_schema(&settings.database_path()?)?;
    let persons = load_or_seed_persons(&conn)?;

    let client = Mp3QuranClient::new(
        &settings.catalog_url,
        Duration::from_secs(settings.request_timeout_secs),
    );
    let catalog = CatalogWorker::spawn(Arc::new(client))?;
    let auth = Authenticator::new(settings.admin_emails.clone());
    let media = settings.media_root()?;
    info!(media_dir = %media.dir().display(), "resolving recordings");

    let mut app = App::new(conn, persons, auth, catalog, media, settings.language);
    app.open(Route::resolve(path))?;
    run_app(&mut app)
}

fn print_routes(file: Option<&str>) -> Result<()> {
    let source = file.unwrap_or(ROUTE_SOURCE);
    for route in discover_routes(Path::new(source), &DiscoveryOptions::default()) {
        println!("{route}");
    }
    Ok(())
}

/// The root is listed first; every other static route follows in
/// declaration order.
fn print_sitemap(settings: &Settings, host: Option<&str>) -> Result<()> {
    let options = DiscoveryOptions {
        exclude: vec!["/".to_string(), "*".to_string()],
        ..DiscoveryOptions::default()
    };
    let mut routes = vec!["/".to_string()];
    routes.extend(discover_routes(Path::new(ROUTE_SOURCE), &options));
    let host = host.unwrap_or(settings.sitemap_host.as_str());
    print!("{}", render_sitemap(host, &routes));
    Ok(())
}

fn set_admin(settings: &Settings, email: Option<&str>, grant: bool) -> Result<()> {
    let email = email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .ok_or_else(|| anyhow!("an email address is required\n{USAGE}"))?;

    let conn = ensure_schema(&settings.database_path()?)?;
    let user = find_user_by_email(&conn, &email)?
        .with_context(|| format!("no account is registered for {email}"))?;

    if grant {
        grant_role(&conn, user.id, Role::Admin)?;
        println!("{email} is now an admin");
    } else {
        revoke_role(&conn, user.id, Role::Admin)?;
        println!("{email} is no longer an admin");
    }
    Ok(())
}
