pub mod error;
pub mod settings;

pub use error::*;
pub use settings::{PollSettings, ProviderSettings, Settings, VolumeSettings};

use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 2] = ["diskflow.local.yaml", "diskflow.yaml"];

/// グローバル設定ファイルのパス (~/.config/diskflow/config.yaml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("diskflow").join("config.yaml"))
}

/// 設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 DISKFLOW_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: diskflow.local.yaml, diskflow.yaml
/// 3. ./.diskflow/ ディレクトリ内: 同様の順序
/// 4. ~/.config/diskflow/config.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var("DISKFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    if let Some(path) = first_existing(&current_dir) {
        return Ok(path);
    }

    // 3. ./.diskflow/ ディレクトリで検索
    let local_dir = current_dir.join(".diskflow");
    if local_dir.is_dir()
        && let Some(path) = first_existing(&local_dir)
    {
        return Ok(path);
    }

    // 4. グローバル設定ファイル
    if let Some(global_config) = global_config_path()
        && global_config.exists()
    {
        return Ok(global_config);
    }

    Err(ConfigError::ConfigNotFound)
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|filename| dir.join(filename))
        .find(|path| path.exists())
}

/// 指定パスの設定ファイルを読み込む
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    Settings::from_yaml(&content, path)
}

/// 明示パスがあればそれを、なければ検索して読み込む
pub fn load(explicit: Option<&Path>) -> Result<(PathBuf, Settings)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };
    let settings = load_settings(&path)?;
    Ok((path, settings))
}
