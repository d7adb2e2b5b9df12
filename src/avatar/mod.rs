pub mod backend;
pub mod heygen;
pub mod session;

pub use backend::{AvatarBackend, AvatarSignal, AvatarStreamInfo};
pub use heygen::HeygenBackend;
pub use session::{AvatarEvent, AvatarSession};
