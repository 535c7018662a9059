use beholdercore::plugin_dir::{PLUGIN_NAME, TAG_NAME};
use beholdercore::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IsActiveReply {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginTags {
    pub tensors: Vec<String>,
}

/// `{"plugins/beholder": {"tensors": ["beholder-frame"]}}` while the producer
/// is active, `{}` otherwise.
pub type TagsReply = BTreeMap<String, PluginTags>;

pub fn tags_reply(is_active: bool) -> TagsReply {
    let mut tags = TagsReply::new();
    if is_active {
        tags.insert(
            format!("plugins/{}", PLUGIN_NAME),
            PluginTags {
                tensors: vec![TAG_NAME.to_string()],
            },
        );
    }
    tags
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigReply {
    pub config: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReply {
    pub status: String,
}

impl StatusReply {
    pub fn alive() -> Self {
        Self {
            status: "alive".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}
