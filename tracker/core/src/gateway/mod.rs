//! External Service Gateways
//!
//! Access to the remote auth and data services through common traits.
//!
//! # Available Gateways
//!
//! - **Supabase**: hosted GoTrue auth + PostgREST data (default)
//! - **In-memory**: in-process store for offline runs and tests
//!
//! # Usage
//!
//! ```ignore
//! use tracker_core::gateway::{SupabaseClient, SupabaseConfig, AuthGateway};
//!
//! let client = SupabaseClient::new(&SupabaseConfig::new(url, anon_key))?;
//! let user = client.sign_in("me@example.com", "hunter22").await?;
//! ```

mod memory;
mod query;
mod session;
mod supabase;
mod traits;

pub use memory::InMemoryGateway;
pub use query::{Direction, Filter, OrderBy, Query};
pub use session::{Session, SessionStore};
pub use supabase::{SupabaseClient, SupabaseConfig};
pub use traits::{AuthGateway, DataGateway};
