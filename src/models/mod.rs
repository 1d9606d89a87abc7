//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod librarian;
pub mod library;
pub mod permission;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookWithAuthor};
pub use librarian::{Librarian, LibrarianDetails};
pub use library::{Library, LibraryDetail, LibrarySummary};
pub use permission::{Group, Permission};
pub use user::{Role, User, UserClaims, UserSummary};
