//! IIIF manifest discovery and page enumeration
//!
//! # Module Organization
//!
//! - [`types`] - Manifest schema variants, canvases and image services
//! - [`resolver`] - Three-strategy discovery (direct, warm-up retry, HTML scraping)
//! - [`scrape`] - Manifest link extraction from viewer pages
//!
//! # Examples
//!
//! ```rust,no_run
//! use gallica_fetcher::app::client::{ClientConfig, CookieSnapshot};
//! use gallica_fetcher::app::manifest::{ManifestConfig, ManifestResolver};
//! use gallica_fetcher::app::models::DocumentId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = ClientConfig::default().build_session(&CookieSnapshot::default())?;
//! let id = DocumentId::from_bare("bd6t54208770t")?;
//!
//! let resolver = ManifestResolver::new(&session, ManifestConfig::default());
//! let manifest = resolver.resolve(&id).await?;
//!
//! for canvas in manifest.canvases() {
//!     println!("{}: {}", canvas.ordinal, canvas.image_service()?.image_url(2000));
//! }
//! # Ok(())
//! # }
//! ```

pub mod resolver;
pub mod scrape;
pub mod types;

pub use resolver::{ManifestResolver, ResolveStage};
pub use scrape::ManifestLinkExtractor;
pub use types::{Canvas, ImageService, Manifest, ManifestConfig};
