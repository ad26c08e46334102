//! Domain entities - the core business objects.

mod group;
mod page;
mod post;
mod user;

pub use group::Group;
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use post::{Post, PostCard};
pub use user::{Author, User};
