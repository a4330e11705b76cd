use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    error::LookupError,
    models::{Book, CatalogPage},
    services::catalog::CatalogLookup,
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Catalog lookups against the `book_information` table
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogLookup for PgCatalog {
    async fn find_by_titles(&self, titles: Vec<String>) -> Result<CatalogPage, LookupError> {
        let books: Vec<Book> = sqlx::query_as(
            r#"
            SELECT id, book_id, book_barcode, title, publication_number, primary_author,
                   classification_number, language_code, edition, publisher,
                   publication_place, publication_date, distribution_unit, notes,
                   status, created_at, updated_at
            FROM book_information
            WHERE title = ANY($1)
            "#,
        )
        .bind(titles.as_slice())
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            requested = titles.len(),
            matched = books.len(),
            "Catalog batch lookup completed"
        );

        Ok(CatalogPage::from_books(books))
    }
}
