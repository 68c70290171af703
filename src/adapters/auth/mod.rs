pub mod demo;
pub mod supabase;
