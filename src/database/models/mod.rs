pub mod brand;
pub mod category;
pub mod note;
pub mod parfum;
pub mod user;

pub use brand::{Brand, BrandSummary};
pub use category::{Category, CategorySummary};
pub use note::{Note, NoteRef, NoteSummary, NoteType};
pub use parfum::{ParfumDetail, ParfumListItem, Pyramid};
pub use user::User;
