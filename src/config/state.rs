// Application state module
// Immutable per-process state shared by every connection

use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::handler::ContentRoot;

/// What gets served and how directory/landing requests resolve
#[derive(Debug)]
pub struct Site {
    pub root: ContentRoot,
    pub landing_path: String,
    pub index_file: String,
}

impl Site {
    pub fn new(root: ContentRoot, landing_path: &str, index_file: &str) -> Self {
        Self {
            root,
            landing_path: landing_path.to_string(),
            index_file: index_file.to_string(),
        }
    }
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub site: Site,
    pub active_connections: AtomicUsize,
}

impl AppState {
    /// Build state from configuration, canonicalizing the content root
    pub fn new(config: Config) -> io::Result<Self> {
        let root_dir = match &config.site.root {
            Some(path) => path.clone(),
            None => deployment_dir()?,
        };
        let root = ContentRoot::new(&root_dir)?;
        let site = Site::new(root, &config.site.landing_path, &config.site.index_file);

        Ok(Self {
            config,
            site,
            active_connections: AtomicUsize::new(0),
        })
    }
}

/// Directory holding the running executable
fn deployment_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent().map(PathBuf::from).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Executable has no parent directory",
        )
    })
}
