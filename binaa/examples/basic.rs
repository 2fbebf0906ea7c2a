//! Basic example of the Binaa container.

use std::sync::Arc;

use binaa::prelude::*;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
    debug: bool,
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

/// Something that answers HTTP routes.
#[derive(Clone)]
struct Route {
    path: &'static str,
}

struct UserService {
    db: Arc<Database>,
    routes: Vec<Route>,
}

impl UserService {
    fn get_user(&self, id: u64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

// === Parameter and result objects ===

#[derive(In)]
struct DatabaseParams {
    config: Arc<Config>,
    logger: Arc<dyn Logger>,
}

#[derive(Out)]
struct DatabaseResults {
    db: Arc<Database>,
}

#[derive(In)]
struct ServiceParams {
    db: Arc<Database>,
    #[binaa(group = "routes")]
    routes: Vec<Route>,
}

#[derive(Out)]
struct ServiceResults {
    service: Arc<UserService>,
}

#[derive(Out)]
struct UsersRoute {
    #[binaa(group = "routes")]
    route: Route,
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("binaa_container=debug")
        .init();

    let mut container = Container::new();

    // Config: a plain constructor with declared results
    container.provide(
        FnConstructor::new(|_| {
            Ok(Outputs::new().with(Arc::new(Config {
                database_url: "postgres://localhost/myapp".to_string(),
                debug: true,
            })))
        })
        .with_name("new_config")
        .result(ResultItem::of::<Arc<Config>>()),
    )?;

    // Logger, also provided as the trait object its consumers ask for
    container.provide_with(
        FnConstructor::new(|_| Ok(Outputs::new().with(Arc::new(ConsoleLogger))))
            .with_name("new_logger")
            .result(ResultItem::of::<Arc<ConsoleLogger>>()),
        [as_interface([Interface::new(|l: Arc<ConsoleLogger>| l as Arc<dyn Logger>)])],
    )?;

    // Database depends on Config + Logger
    container.provide(
        Typed::new(|p: DatabaseParams| -> Result<DatabaseResults> {
            Ok(DatabaseResults {
                db: Arc::new(Database {
                    url: p.config.database_url.clone(),
                    logger: p.logger,
                }),
            })
        })
        .with_name("new_database"),
    )?;

    // Routes form a value group
    for path in ["/users", "/users/{id}"] {
        container.provide(Typed::new(move |(): ()| -> Result<UsersRoute> {
            Ok(UsersRoute {
                route: Route { path },
            })
        }))?;
    }

    // UserService collects every route
    let info = InfoSink::new();
    container.provide_with(
        Typed::new(|p: ServiceParams| -> Result<ServiceResults> {
            Ok(ServiceResults {
                service: Arc::new(UserService {
                    db: p.db,
                    routes: p.routes,
                }),
            })
        })
        .with_name("new_user_service"),
        [fill_provide_info(&info)],
    )?;

    println!("✅ Container built successfully!");
    println!("{container:?}");
    if let Some(info) = info.get() {
        let inputs: Vec<String> = info.inputs.iter().map(ToString::to_string).collect();
        println!("🔎 UserService #{} needs: {}", info.id, inputs.join(", "));
    }

    // === A second Config is a conflict, and changes nothing ===
    let duplicate = container.provide(
        FnConstructor::new(|_| {
            Ok(Outputs::new().with(Arc::new(Config {
                database_url: String::new(),
                debug: false,
            })))
        })
        .with_name("another_config")
        .result(ResultItem::of::<Arc<Config>>()),
    );
    if let Err(err) = duplicate {
        println!("⚠️  {err}");
    }

    // === Resolve ===
    let config: Arc<Config> = container.resolve()?;
    println!("📋 Config: database_url={}, debug={}", config.database_url, config.debug);

    let service: Arc<UserService> = container.resolve()?;
    println!("👤 {}", service.get_user(42));
    let paths: Vec<&str> = service.routes.iter().map(|r| r.path).collect();
    println!("🛣️  Routes: {}", paths.join(", "));

    println!("\n🎉 Everything works!");
    Ok(())
}
