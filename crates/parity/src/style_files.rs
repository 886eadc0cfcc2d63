//! Component stylesheets stored as `{blocks_dir}/{component}/{component}.css`.

use convergence::{ComponentId, StyleSource, StyleSourceError};
use log::debug;
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct FsStyleSource {
    blocks_dir: PathBuf,
}

impl FsStyleSource {
    pub fn new(blocks_dir: impl Into<PathBuf>) -> Self {
        Self {
            blocks_dir: blocks_dir.into(),
        }
    }

    pub fn path_for(&self, component: &ComponentId) -> PathBuf {
        let id = component.as_str();
        self.blocks_dir.join(id).join(format!("{id}.css"))
    }
}

impl StyleSource for FsStyleSource {
    fn read(&mut self, component: &ComponentId) -> Result<String, StyleSourceError> {
        let path = self.path_for(component);
        debug!("reading {}", path.display());
        fs::read_to_string(&path)
            .map_err(|err| StyleSourceError(format!("cannot read {}: {err}", path.display())))
    }

    fn write(&mut self, component: &ComponentId, text: &str) -> Result<(), StyleSourceError> {
        let path = self.path_for(component);
        debug!("writing {} ({} bytes)", path.display(), text.len());
        fs::write(&path, text)
            .map_err(|err| StyleSourceError(format!("cannot write {}: {err}", path.display())))
    }
}
