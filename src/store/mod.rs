//! Persistence for the remote `profiles` table and an in-process stand-in.

pub mod memory;
pub mod model;
pub mod supabase;
pub mod traits;

pub use memory::MemoryStore;
pub use model::ProfileRecord;
pub use supabase::{SupabaseConfig, SupabaseStore};
pub use traits::ProfileStore;
