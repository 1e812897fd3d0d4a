// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the CASEFORGE_HOME environment variable for isolation.
// When CASEFORGE_HOME is set, all config and data live under that directory.
// When unset, config uses ~/.caseforge/ and data uses XDG_DATA_HOME/caseforge.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<ProjectDirs> = OnceLock::new();

fn project_dirs() -> &'static ProjectDirs {
    PROJECT_DIRS.get_or_init(|| {
        ProjectDirs::from("", "", "caseforge").expect("Could not determine home directory")
    })
}

/// Returns the CASEFORGE_HOME override, if set.
fn caseforge_home() -> Option<PathBuf> {
    std::env::var_os("CASEFORGE_HOME").map(PathBuf::from)
}

/// Configuration directory: $CASEFORGE_HOME/ or ~/.caseforge/
pub fn config_dir() -> PathBuf {
    if let Some(home) = caseforge_home() {
        return home;
    }
    dirs_home().join(".caseforge")
}

/// Data directory: $CASEFORGE_HOME/data/ or ~/.local/share/caseforge/ (or XDG_DATA_HOME/caseforge)
pub fn data_dir() -> PathBuf {
    if let Some(home) = caseforge_home() {
        return home.join("data");
    }
    project_dirs().data_local_dir().to_path_buf()
}

/// Home directory
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
