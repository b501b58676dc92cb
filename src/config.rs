use autoflow_batch::BatchConfig;
use autoflow_interpreter::StepTiming;
use serde::{Deserialize, Serialize};

/// Application configuration, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser connection settings.
    pub browser: BrowserConfig,

    /// Step pacing and poll intervals.
    pub timing: StepTiming,

    /// Batch orchestration settings.
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// DevTools websocket endpoint of a running Chrome instance.
    pub ws_url: String,

    /// Substring that identifies the target page among open tabs.
    pub page_url: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://127.0.0.1:9222".to_string(),
            page_url: "meta.ai".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            timing: StepTiming::default(),
            batch: BatchConfig::default(),
        }
    }
}
