pub mod collection;
pub mod content;
pub mod error;
pub mod model;
pub mod page;
pub mod time;

pub use collection::Collection;
pub use content::ContentKind;
pub use error::{CoreError, ErrorCategory, Result};
pub use model::{Comment, Genre, Movie, Review, User, UserRole};
pub use page::{PageInfo, PageRequest};
pub use time::now_utc;
