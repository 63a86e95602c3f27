//! Catalog queries shared by the route handlers.
//!
//! Reference population is built on [`Collection::find_many`]: the referenced
//! identities of a result set are gathered, fetched with one `is_in` query,
//! and joined back in memory.

use std::sync::Arc;

use catalog_db::{Collection, DocumentId, DocumentStore, Filter, Projection, Record, Result};
use serde::Deserialize;

use super::models::{Author, Book, BookInstance, Choice, Genre, Populated, Status};

/// Typed access to every collection the catalog owns
#[derive(Clone)]
pub struct Catalog {
    pub authors: Collection<Author>,
    pub books: Collection<Book>,
    pub genres: Collection<Genre>,
    pub instances: Collection<BookInstance>,
}

/// Record counts shown on the catalog home page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub books: usize,
    pub copies: usize,
    pub copies_available: usize,
    pub authors: usize,
    pub genres: usize,
}

/// A book with every record it references or is referenced by
#[derive(Debug, Clone)]
pub struct BookDetail {
    pub book: Record<Book>,
    pub author: Option<Record<Author>>,
    pub genres: Vec<Record<Genre>>,
    pub copies: Vec<Record<BookInstance>>,
}

#[derive(Deserialize)]
struct TitleSummary {
    #[serde(rename = "_id")]
    id: DocumentId,
    title: String,
}

#[derive(Deserialize)]
struct NameSummary {
    #[serde(rename = "_id")]
    id: DocumentId,
    name: String,
}

#[derive(Deserialize)]
struct AuthorSummary {
    #[serde(rename = "_id")]
    id: DocumentId,
    first_name: String,
    family_name: String,
}

fn sorted(mut choices: Vec<Choice>) -> Vec<Choice> {
    choices.sort_by(|a, b| a.label.cmp(&b.label));
    choices
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            authors: Collection::new(Arc::clone(&store)),
            books: Collection::new(Arc::clone(&store)),
            genres: Collection::new(Arc::clone(&store)),
            instances: Collection::new(store),
        }
    }

    /// Book titles for the copy form
    pub async fn book_choices(&self) -> Result<Vec<Choice>> {
        let books: Vec<TitleSummary> = self
            .books
            .find_projected(&Filter::all(), &Projection::fields(["title"]))
            .await?;
        Ok(sorted(
            books
                .into_iter()
                .map(|b| Choice {
                    id: b.id,
                    label: b.title,
                })
                .collect(),
        ))
    }

    /// Author names for the book form
    pub async fn author_choices(&self) -> Result<Vec<Choice>> {
        let authors: Vec<AuthorSummary> = self
            .authors
            .find_projected(
                &Filter::all(),
                &Projection::fields(["first_name", "family_name"]),
            )
            .await?;
        Ok(sorted(
            authors
                .into_iter()
                .map(|a| Choice {
                    id: a.id,
                    label: format!("{}, {}", a.family_name, a.first_name),
                })
                .collect(),
        ))
    }

    /// Genre names for the book form
    pub async fn genre_choices(&self) -> Result<Vec<Choice>> {
        let genres: Vec<NameSummary> = self
            .genres
            .find_projected(&Filter::all(), &Projection::fields(["name"]))
            .await?;
        Ok(sorted(
            genres
                .into_iter()
                .map(|g| Choice {
                    id: g.id,
                    label: g.name,
                })
                .collect(),
        ))
    }

    pub async fn all_authors(&self) -> Result<Vec<Record<Author>>> {
        let mut authors = self.authors.find(&Filter::all()).await?;
        authors.sort_by(|a, b| a.data.family_name.cmp(&b.data.family_name));
        Ok(authors)
    }

    pub async fn all_genres(&self) -> Result<Vec<Record<Genre>>> {
        let mut genres = self.genres.find(&Filter::all()).await?;
        genres.sort_by(|a, b| a.data.name.cmp(&b.data.name));
        Ok(genres)
    }

    /// Every book with its author resolved, ordered by title
    pub async fn books_with_authors(&self) -> Result<Vec<Populated<Book, Author>>> {
        let mut books = self.books.find(&Filter::all()).await?;
        books.sort_by(|a, b| a.data.title.cmp(&b.data.title));

        let authors = self
            .authors
            .find_many(books.iter().map(|b| b.data.author))
            .await?;
        Ok(books
            .into_iter()
            .map(|record| Populated {
                reference: authors.get(&record.data.author).cloned(),
                record,
            })
            .collect())
    }

    /// Every copy with its book resolved
    pub async fn instances_with_books(&self) -> Result<Vec<Populated<BookInstance, Book>>> {
        let copies = self.instances.find(&Filter::all()).await?;
        let books = self
            .books
            .find_many(copies.iter().map(|c| c.data.book))
            .await?;
        Ok(copies
            .into_iter()
            .map(|record| Populated {
                reference: books.get(&record.data.book).cloned(),
                record,
            })
            .collect())
    }

    pub async fn instance_with_book(
        &self,
        id: &DocumentId,
    ) -> Result<Option<Populated<BookInstance, Book>>> {
        let Some(record) = self.instances.find_by_id(id).await? else {
            return Ok(None);
        };
        let reference = self.books.find_by_id(&record.data.book).await?;
        Ok(Some(Populated { record, reference }))
    }

    /// Books written by `author`
    pub async fn books_by_author(&self, author: &DocumentId) -> Result<Vec<Record<Book>>> {
        self.books.find(&Filter::all().eq("author", *author)).await
    }

    /// Books tagged with `genre`
    pub async fn books_in_genre(&self, genre: &DocumentId) -> Result<Vec<Record<Book>>> {
        self.books.find(&Filter::all().eq("genre", *genre)).await
    }

    /// Copies of `book`
    pub async fn copies_of(&self, book: &DocumentId) -> Result<Vec<Record<BookInstance>>> {
        self.instances.find(&Filter::all().eq("book", *book)).await
    }

    pub async fn genre_named(&self, name: &str) -> Result<Option<Record<Genre>>> {
        Ok(self
            .genres
            .find(&Filter::all().eq("name", name))
            .await?
            .into_iter()
            .next())
    }

    /// The book plus its author, genres, and copies
    pub async fn book_detail(&self, id: &DocumentId) -> Result<Option<BookDetail>> {
        let (book, copies) = tokio::try_join!(self.books.find_by_id(id), self.copies_of(id))?;
        let Some(book) = book else {
            return Ok(None);
        };

        let (author, genres) = tokio::try_join!(
            self.authors.find_by_id(&book.data.author),
            self.genres.find_many(book.data.genre.iter().copied()),
        )?;
        let genres = book
            .data
            .genre
            .iter()
            .filter_map(|id| genres.get(id).cloned())
            .collect();

        Ok(Some(BookDetail {
            book,
            author,
            genres,
            copies,
        }))
    }

    pub async fn counts(&self) -> Result<Counts> {
        let all = Filter::all();
        let available = Filter::all().eq("status", Status::Available.as_str());
        let (books, copies, copies_available, authors, genres) = tokio::try_join!(
            self.books.count(&all),
            self.instances.count(&all),
            self.instances.count(&available),
            self.authors.count(&all),
            self.genres.count(&all),
        )?;
        Ok(Counts {
            books,
            copies,
            copies_available,
            authors,
            genres,
        })
    }
}
