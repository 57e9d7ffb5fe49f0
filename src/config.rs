use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::Level;


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 日志级别 (trace / debug / info / warn / error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 前端页面运行时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// 暴露给页面的环境变量名，按顺序写入注入的对象
    #[serde(default = "default_env_keys")]
    pub env_keys: Vec<String>,
    /// 注入到 window 上的全局变量名
    #[serde(default = "default_global_name")]
    pub global_name: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            env_keys: default_env_keys(),
            global_name: default_global_name(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_env_keys() -> Vec<String> {
    vec!["NO_AUTH".to_string()]
}

fn default_global_name() -> String {
    "ENV".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                log_level: default_log_level(),
            },
            frontend: FrontendConfig::default(),
        }
    }
}

impl Config {
    /// 加载配置文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 创建默认配置文件
    pub fn create_default(path: impl AsRef<Path>) -> Result<Self> {
        let default_config = Config::default();
        let yaml = serde_yaml::to_string(&default_config)?;
        fs::write(path, yaml)?;
        Ok(default_config)
    }

    /// 配置文件存在则加载，否则写入默认配置并返回 (配置, 是否新建)
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            Ok((Self::load(path)?, false))
        } else {
            Ok((Self::create_default(path)?, true))
        }
    }

    pub fn log_level(&self) -> Result<Level> {
        self.server.log_level.parse::<Level>()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", self.server.log_level))
    }

    /// 校验配置：变量名会原样写进 JS 对象字面量，必须是合法标识符
    pub fn validate(&self) -> Result<()> {
        self.log_level()?;

        if !is_js_identifier(&self.frontend.global_name) {
            bail!("Invalid global_name: {:?}", self.frontend.global_name);
        }

        let mut seen = HashSet::new();
        for key in &self.frontend.env_keys {
            if !is_js_identifier(key) {
                bail!("Invalid env key: {:?}", key);
            }
            if !seen.insert(key.as_str()) {
                bail!("Duplicate env key: {}", key);
            }
        }
        Ok(())
    }
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
