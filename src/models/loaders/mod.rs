pub mod toml_loader;

pub use toml_loader::{load_all_import_jobs, load_import_job};
