//! The user-facing cache handles.

mod loading;
mod sync;

pub use loading::LoadingCache;
pub use sync::Cache;
