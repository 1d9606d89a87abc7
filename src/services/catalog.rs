//! Catalog management service: authors, books, libraries and librarians

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorQuery, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, BookWithAuthor, CreateBook, UpdateBook},
        librarian::{CreateLibrarian, Librarian, LibrarianDetails, LibrarianQuery, UpdateLibrarian},
        library::{CreateLibrary, Library, LibraryDetail, LibraryQuery, LibrarySummary, UpdateLibrary},
    },
    repository::{Page, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // Authors

    pub async fn search_authors(&self, query: &AuthorQuery, page: Page) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.search(query, page).await
    }

    pub async fn get_author(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        let created = self.repository.authors.create(author.name.trim()).await?;
        tracing::info!(author_id = created.id, "Author created");
        Ok(created)
    }

    pub async fn update_author(&self, id: i64, author: UpdateAuthor) -> AppResult<Author> {
        author.validate()?;
        match author.name {
            Some(ref name) => self.repository.authors.update(id, name.trim()).await,
            None => self.repository.authors.get_by_id(id).await,
        }
    }

    /// Delete an author together with all of their books
    pub async fn delete_author(&self, id: i64) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    // Books

    /// Every book with its author, ordered by title
    pub async fn list_books(&self) -> AppResult<Vec<BookWithAuthor>> {
        self.repository.books.list_with_authors().await
    }

    pub async fn search_books(&self, query: &BookQuery, page: Page) -> AppResult<(Vec<BookWithAuthor>, i64)> {
        self.repository.books.search(query, page).await
    }

    pub async fn get_book(&self, id: i64) -> AppResult<BookWithAuthor> {
        self.repository.books.get_with_author(id).await
    }

    /// Create a book; its author must already exist
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        self.ensure_author(book.author_id).await?;

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, author_id = created.author_id, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, id: i64, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.get_by_id(id).await?;
        if let Some(author_id) = book.author_id {
            self.ensure_author(author_id).await?;
        }

        let updated = self.repository.books.update(id, &book).await?;
        tracing::info!(book_id = id, "Book updated");
        Ok(updated)
    }

    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    async fn ensure_author(&self, author_id: i64) -> AppResult<()> {
        if self.repository.authors.exists(author_id).await? {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Author with id {} does not exist", author_id)))
        }
    }

    // Libraries

    pub async fn search_libraries(
        &self,
        query: &LibraryQuery,
        page: Page,
    ) -> AppResult<(Vec<LibrarySummary>, i64)> {
        self.repository.libraries.search(query, page).await
    }

    /// Library with the books it holds and their authors
    pub async fn get_library(&self, id: i64) -> AppResult<LibraryDetail> {
        let library = self.repository.libraries.get_by_id(id).await?;
        let books = self.repository.books.list_by_library(id).await?;
        Ok(LibraryDetail {
            id: library.id,
            name: library.name,
            books,
        })
    }

    pub async fn create_library(&self, library: CreateLibrary) -> AppResult<LibrarySummary> {
        library.validate()?;
        self.ensure_books(&library.book_ids).await?;

        let created = self
            .repository
            .libraries
            .create(library.name.trim(), &library.book_ids)
            .await?;
        tracing::info!(library_id = created.id, books = library.book_ids.len(), "Library created");
        self.repository.libraries.get_summary(created.id).await
    }

    pub async fn update_library(&self, id: i64, library: UpdateLibrary) -> AppResult<LibrarySummary> {
        library.validate()?;
        if let Some(ref book_ids) = library.book_ids {
            self.ensure_books(book_ids).await?;
        }

        let updated: Library = self
            .repository
            .libraries
            .update(id, library.name.as_deref().map(str::trim), library.book_ids.as_deref())
            .await?;
        self.repository.libraries.get_summary(updated.id).await
    }

    /// Delete a library; its librarian is removed with it
    pub async fn delete_library(&self, id: i64) -> AppResult<()> {
        self.repository.libraries.delete(id).await?;
        tracing::info!(library_id = id, "Library deleted");
        Ok(())
    }

    async fn ensure_books(&self, book_ids: &[i64]) -> AppResult<()> {
        let missing = self.repository.books.missing_ids(book_ids).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Unknown book ids: {:?}", missing)))
        }
    }

    // Librarians

    pub async fn search_librarians(
        &self,
        query: &LibrarianQuery,
        page: Page,
    ) -> AppResult<(Vec<LibrarianDetails>, i64)> {
        self.repository.librarians.search(query, page).await
    }

    pub async fn get_librarian(&self, id: i64) -> AppResult<LibrarianDetails> {
        self.repository.librarians.get_by_id(id).await
    }

    /// Create a librarian; a library has at most one, and so does a user
    pub async fn create_librarian(&self, librarian: CreateLibrarian) -> AppResult<Librarian> {
        librarian.validate()?;
        self.repository.libraries.get_by_id(librarian.library_id).await?;
        self.ensure_library_free(librarian.library_id, None).await?;

        if let Some(user_id) = librarian.user_id {
            self.ensure_user_free(user_id, None).await?;
        }

        let created = self.repository.librarians.create(&librarian).await?;
        tracing::info!(
            librarian_id = created.id,
            library_id = created.library_id,
            "Librarian assigned"
        );
        Ok(created)
    }

    pub async fn update_librarian(&self, id: i64, librarian: UpdateLibrarian) -> AppResult<Librarian> {
        librarian.validate()?;
        self.repository.librarians.get_by_id(id).await?;

        if let Some(library_id) = librarian.library_id {
            self.repository.libraries.get_by_id(library_id).await?;
            self.ensure_library_free(library_id, Some(id)).await?;
        }
        if let Some(Some(user_id)) = librarian.user_id {
            self.ensure_user_free(user_id, Some(id)).await?;
        }

        self.repository.librarians.update(id, &librarian).await
    }

    pub async fn delete_librarian(&self, id: i64) -> AppResult<()> {
        self.repository.librarians.delete(id).await?;
        tracing::info!(librarian_id = id, "Librarian removed");
        Ok(())
    }

    async fn ensure_library_free(&self, library_id: i64, exclude_id: Option<i64>) -> AppResult<()> {
        if self.repository.librarians.library_taken(library_id, exclude_id).await? {
            return Err(AppError::Conflict(format!(
                "Library {} already has a librarian",
                library_id
            )));
        }
        Ok(())
    }

    async fn ensure_user_free(&self, user_id: i64, exclude_id: Option<i64>) -> AppResult<()> {
        self.repository.users.get_by_id(user_id).await?;
        if self.repository.librarians.user_taken(user_id, exclude_id).await? {
            return Err(AppError::Conflict(format!(
                "User {} is already a librarian",
                user_id
            )));
        }
        Ok(())
    }

    // Lookups by name

    /// All books written by the author with this exact name
    pub async fn books_by_author_name(&self, name: &str) -> AppResult<Vec<BookWithAuthor>> {
        let author = single(
            self.repository.authors.find_by_name(name).await?,
            "Author",
            name,
        )?;
        self.repository.books.list_by_author(author.id).await
    }

    /// All books held by the library with this exact name
    pub async fn books_in_library(&self, name: &str) -> AppResult<LibraryDetail> {
        let library = single(
            self.repository.libraries.find_by_name(name).await?,
            "Library",
            name,
        )?;
        self.get_library(library.id).await
    }

    /// Librarian of the library with this exact name
    pub async fn librarian_for_library(&self, name: &str) -> AppResult<LibrarianDetails> {
        let library = single(
            self.repository.libraries.find_by_name(name).await?,
            "Library",
            name,
        )?;
        self.repository
            .librarians
            .get_by_library(library.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library '{}' has no librarian", name)))
    }
}

/// Exactly one row must carry the name
fn single<T>(mut rows: Vec<T>, kind: &str, name: &str) -> AppResult<T> {
    match rows.len() {
        0 => Err(AppError::NotFound(format!("{} '{}' not found", kind, name))),
        1 => Ok(rows.remove(0)),
        n => Err(AppError::Conflict(format!(
            "{} {} records are named '{}'",
            n, kind, name
        ))),
    }
}
