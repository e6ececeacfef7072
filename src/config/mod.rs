//! Configuration module for Clarifier
//!
//! This module handles:
//! - Scoring configuration (clarifier.toml)
//! - Training defaults
//! - Judge backend selection and credentials

mod project_config;
mod user_config;

pub use project_config::{
    default_model_path, init_project_config, load_config, load_config_file, user_config_path,
    ClarifierConfig, EngineConfig, HeuristicsConfig, JudgeConfig, ModelConfig, MODEL_PATH_ENV,
    PROJECT_CONFIG_FILE,
};
pub use user_config::{AiKeys, UserConfig};
