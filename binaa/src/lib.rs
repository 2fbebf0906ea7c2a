//! # Binaa: constructor registry and dependency graph for Rust
//!
//! Register constructors, let Binaa work out which values each one
//! provides and needs, and resolve values on demand. Every registration
//! is transactional: a conflict or a cycle leaves the container as it
//! was.
//!
//! ```rust
//! use binaa::prelude::*;
//! use std::sync::Arc;
//!
//! struct Config { url: String }
//! struct Database { url: String }
//!
//! #[derive(In)]
//! struct DatabaseParams {
//!     config: Arc<Config>,
//! }
//!
//! #[derive(Out)]
//! struct DatabaseResults {
//!     db: Arc<Database>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .provide(
//!         FnConstructor::new(|_| {
//!             Ok(Outputs::new().with(Arc::new(Config { url: "postgres://localhost".into() })))
//!         })
//!         .result(ResultItem::of::<Arc<Config>>()),
//!     )
//!     .expect("config registers");
//! container
//!     .provide(Typed::new(|p: DatabaseParams| -> Result<DatabaseResults> {
//!         Ok(DatabaseResults {
//!             db: Arc::new(Database { url: p.config.url.clone() }),
//!         })
//!     }))
//!     .expect("database registers");
//!
//! let db: Arc<Database> = container.resolve().expect("database resolves");
//! assert_eq!(db.url, "postgres://localhost");
//! ```

pub use binaa_container::*;
pub use binaa_derive::*;
pub use binaa_support::*;

/// Everything needed to register and resolve constructors, derives
/// included.
pub mod prelude {
    pub use binaa_container::prelude::*;
    pub use binaa_derive::{In, Out};
}
