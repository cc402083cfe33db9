use directories::ProjectDirs;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub struct AppPaths {
    project_dirs: ProjectDirs,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("io", "csvchat", "csvchat")
            .ok_or_else(|| Error::platform("Failed to determine application directories"))?;

        Ok(Self { project_dirs })
    }

    pub fn config_dir(&self) -> PathBuf {
        self.project_dirs.config_dir().to_path_buf()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.project_dirs.data_dir().to_path_buf()
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    pub fn ensure_dirs_exist(&self) -> Result<()> {
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
