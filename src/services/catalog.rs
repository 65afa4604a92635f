//! Catalog service: genres, languages, authors and books

use std::collections::HashMap;

use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetail, AuthorInput},
        book::{display_author, display_genre, BookDetail, BookInput, BookSummary},
        book_instance::LoanStatus,
        genre::{Genre, GenreInput},
        language::{Language, LanguageInput},
        page::Pagination,
    },
    repository::{book_instances::InstanceFilter, Repository},
};

use super::{today, unknown_reference};

/// Counters shown on the home page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCounts {
    pub books: i64,
    pub books_with_word: i64,
    pub book_instances: i64,
    pub available_book_instances: i64,
    pub authors: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    /// Collect home page counters
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        let available = InstanceFilter {
            status: Some(LoanStatus::Available),
            ..Default::default()
        };

        Ok(CatalogCounts {
            books: self.repository.books_count().await?,
            books_with_word: self
                .repository
                .books_count_title_contains(&self.config.highlight_word)
                .await?,
            book_instances: self
                .repository
                .book_instances_count(&InstanceFilter::default())
                .await?,
            available_book_instances: self.repository.book_instances_count(&available).await?,
            authors: self.repository.authors_count().await?,
        })
    }

    // Genres

    pub async fn list_genres(&self, page: Option<i64>) -> AppResult<(Vec<Genre>, Pagination)> {
        let total = self.repository.genres_count().await?;
        let pagination = Pagination::new(page, self.config.page_size, total)?;
        let genres = self
            .repository
            .genres_list(pagination.limit(), pagination.offset())
            .await?;
        Ok((genres, pagination))
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres_get_by_id(id).await
    }

    pub async fn create_genre(&self, data: GenreInput) -> AppResult<Genre> {
        data.validate()?;
        if self.repository.genres_name_exists(&data.name, None).await? {
            return Err(AppError::Conflict("Genre already exists".to_string()));
        }
        self.repository.genres_create(&data.name).await
    }

    pub async fn update_genre(&self, id: i32, data: GenreInput) -> AppResult<Genre> {
        data.validate()?;
        self.repository.genres_get_by_id(id).await?;
        if self.repository.genres_name_exists(&data.name, Some(id)).await? {
            return Err(AppError::Conflict("Genre already exists".to_string()));
        }
        self.repository.genres_update(id, &data.name).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres_delete(id).await
    }

    // Languages

    pub async fn list_languages(&self, page: Option<i64>) -> AppResult<(Vec<Language>, Pagination)> {
        let total = self.repository.languages_count().await?;
        let pagination = Pagination::new(page, self.config.page_size, total)?;
        let languages = self
            .repository
            .languages_list(pagination.limit(), pagination.offset())
            .await?;
        Ok((languages, pagination))
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages_get_by_id(id).await
    }

    pub async fn create_language(&self, data: LanguageInput) -> AppResult<Language> {
        data.validate()?;
        if self.repository.languages_name_exists(&data.name, None).await? {
            return Err(AppError::Conflict("Language already exists".to_string()));
        }
        self.repository.languages_create(&data.name).await
    }

    pub async fn update_language(&self, id: i32, data: LanguageInput) -> AppResult<Language> {
        data.validate()?;
        self.repository.languages_get_by_id(id).await?;
        if self.repository.languages_name_exists(&data.name, Some(id)).await? {
            return Err(AppError::Conflict("Language already exists".to_string()));
        }
        self.repository.languages_update(id, &data.name).await
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.repository.languages_delete(id).await
    }

    // Authors

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<(Vec<Author>, Pagination)> {
        let total = self.repository.authors_count().await?;
        let pagination = Pagination::new(page, self.config.page_size, total)?;
        let authors = self
            .repository
            .authors_list(pagination.limit(), pagination.offset())
            .await?;
        Ok((authors, pagination))
    }

    /// Author with the books credited to them
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors_get_by_id(id).await?;
        let books = self.repository.authors_books(id).await?;
        Ok(AuthorDetail { author, books })
    }

    pub async fn create_author(&self, data: AuthorInput) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors_create(&data).await
    }

    pub async fn update_author(&self, id: i32, data: AuthorInput) -> AppResult<Author> {
        data.validate()?;
        self.repository.authors_update(id, &data).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors_delete(id).await
    }

    // Books

    /// One page of books with their credits rendered
    pub async fn list_books(&self, page: Option<i64>) -> AppResult<(Vec<BookSummary>, Pagination)> {
        let total = self.repository.books_count().await?;
        let pagination = Pagination::new(page, self.config.page_size, total)?;
        let books = self
            .repository
            .books_list(pagination.limit(), pagination.offset())
            .await?;

        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let mut authors = group_by_book(self.repository.authors_for_books(&ids).await?);
        let mut genres = group_by_book(self.repository.genres_for_books(&ids).await?);

        let summaries = books
            .into_iter()
            .map(|book| {
                let book_authors = authors.remove(&book.id).unwrap_or_default();
                let book_genres = genres.remove(&book.id).unwrap_or_default();
                BookSummary {
                    id: book.id,
                    title: book.title,
                    isbn: book.isbn,
                    display_author: display_author(&book_authors),
                    display_genre: display_genre(&book_genres),
                }
            })
            .collect();

        Ok((summaries, pagination))
    }

    /// Book with authors, genres, language and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books_get_by_id(id).await?;

        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages_get_by_id(language_id).await?),
            None => None,
        };
        let authors: Vec<Author> = self
            .repository
            .authors_for_books(&[id])
            .await?
            .into_iter()
            .map(|(_, author)| author)
            .collect();
        let genres: Vec<Genre> = self
            .repository
            .genres_for_books(&[id])
            .await?
            .into_iter()
            .map(|(_, genre)| genre)
            .collect();

        let today = today();
        let copies = self
            .repository
            .book_instances_for_book(id)
            .await?
            .into_iter()
            .map(|copy| copy.into_details(today))
            .collect();

        Ok(BookDetail {
            id: book.id,
            display_author: display_author(&authors),
            display_genre: display_genre(&genres),
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            language,
            authors,
            genres,
            copies,
        })
    }

    pub async fn create_book(&self, data: BookInput) -> AppResult<BookDetail> {
        self.check_book_input(&data, None).await?;
        let book = self.repository.books_create(&data).await?;
        tracing::info!("Book {} created: {}", book.id, book);
        self.get_book(book.id).await
    }

    pub async fn update_book(&self, id: i32, data: BookInput) -> AppResult<BookDetail> {
        self.repository.books_get_by_id(id).await?;
        self.check_book_input(&data, Some(id)).await?;
        self.repository.books_update(id, &data).await?;
        self.get_book(id).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books_delete(id).await
    }

    /// Field validation, ISBN uniqueness and referenced rows
    async fn check_book_input(&self, data: &BookInput, exclude_id: Option<i32>) -> AppResult<()> {
        data.validate()?;

        if self.repository.books_isbn_exists(&data.isbn, exclude_id).await? {
            return Err(AppError::Conflict("Book with this ISBN already exists".to_string()));
        }

        let author_ids = distinct(&data.author_ids);
        if self.repository.authors_count_existing(&author_ids).await? != author_ids.len() as i64 {
            return Err(AppError::Validation("Unknown author in author_ids".to_string()));
        }

        let genre_ids = distinct(&data.genre_ids);
        if self.repository.genres_count_existing(&genre_ids).await? != genre_ids.len() as i64 {
            return Err(AppError::Validation("Unknown genre in genre_ids".to_string()));
        }

        if let Some(language_id) = data.language_id {
            self.repository
                .languages_get_by_id(language_id)
                .await
                .map_err(unknown_reference(format!("Unknown language {}", language_id)))?;
        }

        Ok(())
    }
}

fn distinct(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Group (book_id, value) pairs per book, keeping their order
fn group_by_book<T>(pairs: Vec<(i32, T)>) -> HashMap<i32, Vec<T>> {
    let mut grouped: HashMap<i32, Vec<T>> = HashMap::new();
    for (book_id, value) in pairs {
        grouped.entry(book_id).or_default().push(value);
    }
    grouped
}
