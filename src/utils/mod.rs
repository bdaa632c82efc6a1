pub mod environment;
pub mod paths;

pub use environment::server_url_from_env;
pub use paths::{
    ChatPaths, decode_component, decode_server_path, encode_component, validate_relative_path,
};
