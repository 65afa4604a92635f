//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetail, BookShort, BookSummary};
pub use book_instance::{BookInstance, BookInstanceDetails, LoanStatus};
pub use genre::Genre;
pub use language::Language;
pub use page::{PageQuery, Pagination};
pub use user::{Permission, User, UserClaims, UserShort};
