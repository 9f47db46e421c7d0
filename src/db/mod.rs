// Remote database access (Supabase PostgREST)

pub mod supabase;

pub use supabase::{DbError, SupabaseClient};
