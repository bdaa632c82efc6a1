/// Marker every conversation folder name starts with
pub const CHAT_FOLDER_PREFIX: &str = "WhatsApp Chat with ";
/// Server path holding the conversation folders (autoindex and file fetches)
pub const SERVER_DATA_PATH_PREFIX: &str = "/chats/";
/// Path prefix used for navigable client routes
pub const CLIENT_ROUTING_PATH_PREFIX: &str = "/chat/";

/// Prefixes shared by the codec, the directory listing and the loader.
///
/// Both path prefixes must start and end with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub folder_prefix: String,
    pub data_prefix: String,
    pub client_prefix: String,
}

impl ViewerConfig {
    pub fn with_folder_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.folder_prefix = prefix.into();
        self
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            folder_prefix: CHAT_FOLDER_PREFIX.to_string(),
            data_prefix: SERVER_DATA_PATH_PREFIX.to_string(),
            client_prefix: CLIENT_ROUTING_PATH_PREFIX.to_string(),
        }
    }
}
