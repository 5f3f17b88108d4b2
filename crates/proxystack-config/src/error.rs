use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "必須の設定が不足しています: {}\n\
        ヒント: .env ファイルまたは環境変数で設定してください",
        keys.join(", ")
    )]
    MissingConfiguration { keys: Vec<&'static str> },

    #[error(".env ファイルの読み込みに失敗しました: {}\n理由: {message}", path.display())]
    EnvFile { path: PathBuf, message: String },
}

impl ConfigError {
    /// Keys reported missing, empty for other variants
    pub fn missing_keys(&self) -> &[&'static str] {
        match self {
            ConfigError::MissingConfiguration { keys } => keys,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
