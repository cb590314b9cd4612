//! The prompt template store.
//!
//! Templates are keyed by language (`"english"`, `"chinese"`,
//! `"traditional_chinese"`). The file format is the same JSON shape as the
//! built-in set:
//!
//! ```json
//! {
//!   "english": {
//!     "basic": "Analyze this image ...",
//!     "with_coordinates": "... {latitude} ... {longitude} ..."
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::Language;
use crate::error::ConfigError;

/// The prompt variants for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Used when no coordinates are supplied
    pub basic: String,

    /// Used with coordinates; contains `{latitude}` and `{longitude}`
    pub with_coordinates: String,

    /// Used with a free-text location; contains `{location}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_location: Option<String>,
}

/// Language-keyed template store. Read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplates {
    templates: HashMap<String, PromptTemplate>,
}

const ENGLISH_BASIC: &str = "Analyze this image and identify what it shows:

1. Is this a specific landmark, building, or location?
2. If it's a famous place, provide its exact name and location
3. If it's a common object/scene, describe it accurately
4. Your confidence level in this identification

Be specific and factual.";

const ENGLISH_WITH_COORDINATES: &str = "This photo was taken at latitude {latitude}, \
longitude {longitude}. Use these coordinates to identify the specific landmark, building, \
or place shown in the image.";

const ENGLISH_WITH_LOCATION: &str = "Analyze this image with the context that it might be from: {location}

Please identify:
1. What specific place, landmark, or location is this?
2. If it matches known places in {location}, provide the exact name and location
3. If it's a common object/scene, describe it accurately
4. Your confidence level in this identification
5. If the image content is not found in {location}, reply \"not found in {location}\"

Be specific and factual. If unsure, say so.";

const CHINESE_BASIC: &str = "分析这张图片并识别其内容：

1. 这是特定的地标、建筑或地点吗？
2. 如果是著名地点，请提供确切名称和位置
3. 如果是普通物体或场景，请准确描述
4. 你对该识别结果的置信度

请具体并基于事实作答，使用简体中文。";

const CHINESE_WITH_COORDINATES: &str = "这张照片拍摄于纬度 {latitude}、经度 {longitude}。\
请结合这些坐标识别图中具体的地标、建筑或地点，并使用简体中文回答。";

const CHINESE_WITH_LOCATION: &str = "请在以下背景下分析这张图片：它可能来自 {location}。

请识别：
1. 这是哪个具体的地点、地标或位置？
2. 如果与 {location} 的已知地点相符，请提供确切名称和位置
3. 如果是普通物体或场景，请准确描述
4. 你对该识别结果的置信度
5. 如果图片内容不在 {location}，请回复“在 {location} 未找到”

请具体并基于事实作答；如不确定，请说明。";

const TRADITIONAL_CHINESE_BASIC: &str = "分析這張圖片並識別其內容：

1. 這是特定的地標、建築或地點嗎？
2. 如果是著名地點，請提供確切名稱和位置
3. 如果是普通物體或場景，請準確描述
4. 你對該識別結果的信心程度

請具體並基於事實作答，使用繁體中文。";

const TRADITIONAL_CHINESE_WITH_COORDINATES: &str = "這張照片拍攝於緯度 {latitude}、經度 {longitude}。\
請結合這些座標識別圖中具體的地標、建築或地點，並使用繁體中文回答。";

const TRADITIONAL_CHINESE_WITH_LOCATION: &str = "請在以下背景下分析這張圖片：它可能來自 {location}。

請識別：
1. 這是哪個具體的地點、地標或位置？
2. 如果與 {location} 的已知地點相符，請提供確切名稱和位置
3. 如果是普通物體或場景，請準確描述
4. 你對該識別結果的信心程度
5. 如果圖片內容不在 {location}，請回覆「在 {location} 未找到」

請具體並基於事實作答；如不確定，請說明。";

impl PromptTemplates {
    /// The templates compiled into the binary, one per [`Language`].
    pub fn builtin() -> Self {
        let entry = |basic: &str, with_coordinates: &str, with_location: &str| PromptTemplate {
            basic: basic.to_string(),
            with_coordinates: with_coordinates.to_string(),
            with_location: Some(with_location.to_string()),
        };

        let mut templates = HashMap::new();
        templates.insert(
            Language::English.key().to_string(),
            entry(ENGLISH_BASIC, ENGLISH_WITH_COORDINATES, ENGLISH_WITH_LOCATION),
        );
        templates.insert(
            Language::Chinese.key().to_string(),
            entry(CHINESE_BASIC, CHINESE_WITH_COORDINATES, CHINESE_WITH_LOCATION),
        );
        templates.insert(
            Language::TraditionalChinese.key().to_string(),
            entry(
                TRADITIONAL_CHINESE_BASIC,
                TRADITIONAL_CHINESE_WITH_COORDINATES,
                TRADITIONAL_CHINESE_WITH_LOCATION,
            ),
        );
        Self { templates }
    }

    /// Load a template store from a JSON file. The file replaces the built-in set.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| ConfigError::TemplateError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse a template store from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Template for `language`, or for `default_language` when the store has
    /// no entry for it.
    pub fn select(&self, language: Language, default_language: &str) -> Option<&PromptTemplate> {
        self.templates.get(language.key()).or_else(|| {
            tracing::debug!(
                "No '{}' prompt template, using '{default_language}'",
                language.key()
            );
            self.templates.get(default_language)
        })
    }

    /// Template stored under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&PromptTemplate> {
        self.templates.get(key)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}
