mod account;
mod post;

pub use account::*;
pub use post::*;
