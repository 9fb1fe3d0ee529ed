pub mod comments;
pub mod frames;

pub use comments::gif_comments;
pub use frames::read_frames;
