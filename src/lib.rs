pub mod config;
pub mod error;
pub mod player;
pub mod playlist;
pub mod processing {
    pub mod layout;
}
pub mod render {
    pub mod cache;
    pub mod compositor;
    pub mod loader;
    pub mod surface;
}

pub use player::{ImagePlayer, PlayerKind, create_player};
pub use playlist::ImageDescriptor;
