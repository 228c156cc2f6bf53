use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    ports::{SettingsMap, SettingsStore},
    Result,
};

/// Module settings kept in a single JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
}

impl JsonFileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettings {
    async fn load(&self) -> Result<SettingsMap> {
        let txt = match tokio::fs::read_to_string(&self.path).await {
            Ok(txt) => txt,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SettingsMap::new()),
            Err(e) => return Err(e.into()),
        };
        if txt.trim().is_empty() {
            return Ok(SettingsMap::new());
        }
        Ok(serde_json::from_str(&txt)?)
    }

    async fn save(&self, settings: &SettingsMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let txt = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, txt).await?;
        Ok(())
    }
}
