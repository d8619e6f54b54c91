use std::fs;

use memorial_manager::routes::{discover_routes, render_sitemap, DiscoveryOptions};
use tempfile::TempDir;

#[test]
fn missing_routing_source_yields_nothing() {
    let dir = TempDir::new().unwrap();
    let routes = discover_routes(&dir.path().join("absent.rs"), &DiscoveryOptions::default());
    assert!(routes.is_empty());
}

#[test]
fn discovers_static_routes_from_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("routes.rs");
    fs::write(
        &path,
        r#"
        pub const ROUTE_TABLE: &[RouteDecl] = &[
            RouteDecl { path: "/", view: View::Home },
            RouteDecl { path: "/about", view: View::Home },
            RouteDecl { path: "/person/:person_id", view: View::PersonDetail },
            RouteDecl {
                path: "/admin",
                view: View::Admin,
            },
            RouteDecl { path: "/about", view: View::Home },
            RouteDecl { path: "*", view: View::NotFound },
        ];
        "#,
    )
    .unwrap();

    let all_static = discover_routes(&path, &DiscoveryOptions::default());
    assert_eq!(all_static, vec!["/", "/about", "/admin", "*"]);

    let options = DiscoveryOptions {
        exclude: vec!["/".into(), "*".into()],
        ..DiscoveryOptions::default()
    };
    let routes = discover_routes(&path, &options);
    assert_eq!(routes, vec!["/about", "/admin"]);

    let xml = render_sitemap("https://example.org", &routes);
    assert!(xml.contains("<loc>https://example.org/about</loc>"));
    assert!(xml.contains("<loc>https://example.org/admin</loc>"));
    assert!(!xml.contains("person"));
}
