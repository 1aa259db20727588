//! Store tests against a live PostgreSQL database.
//!
//! Ignored by default. Run with a disposable database:
//! `DATABASE_URL=postgres://... cargo test --test postgres_tests -- --ignored`

use serde_json::{json, Map};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use bookshelf_server::{
    models::{CreateBook, Reservation},
    repository::{books::BooksRepository, users::UsersRepository, BookStore, UserStore},
};

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn create(title: &str) -> CreateBook {
    let mut fields = Map::new();
    fields.insert("author".to_string(), json!("Test Author"));
    CreateBook {
        title: title.to_string(),
        fields,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn insert_and_find_keep_extra_fields() {
    let repo = BooksRepository::new(connect().await);

    let book = repo.insert(create("Hard Times")).await.unwrap();
    assert_eq!(book.reserved, Reservation::default());
    assert_eq!(book.version, 0);

    let found = repo.find_by_id(book.id).await.unwrap().unwrap();
    assert_eq!(found.title, "Hard Times");
    assert_eq!(found.fields["author"], "Test Author");
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.list().await.unwrap().iter().any(|b| b.id == book.id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn reserving_twice_updates_nothing() {
    let repo = BooksRepository::new(connect().await);
    let book = repo.insert(create("Bleak House")).await.unwrap();

    let reserved = repo.reserve(book.id, "member-1").await.unwrap().unwrap();
    assert_eq!(reserved.reserved, Reservation::held_by("member-1"));
    assert_eq!(reserved.version, 1);

    assert!(repo.reserve(book.id, "member-2").await.unwrap().is_none());
    assert!(repo.reserve(book.id, "member-1").await.unwrap().is_none());

    let stored = repo.find_by_id(book.id).await.unwrap().unwrap();
    assert!(stored.reserved.is_held_by("member-1"));
    assert_eq!(stored.version, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn release_by_another_member_updates_nothing() {
    let repo = BooksRepository::new(connect().await);
    let book = repo.insert(create("Little Dorrit")).await.unwrap();

    assert!(repo.release(book.id, "member-1").await.unwrap().is_none());

    repo.reserve(book.id, "member-1").await.unwrap().unwrap();
    assert!(repo.release(book.id, "member-2").await.unwrap().is_none());

    let stored = repo.find_by_id(book.id).await.unwrap().unwrap();
    assert!(stored.reserved.is_held_by("member-1"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn release_by_the_holder_frees_the_book() {
    let repo = BooksRepository::new(connect().await);
    let book = repo.insert(create("Our Mutual Friend")).await.unwrap();

    repo.reserve(book.id, "member-1").await.unwrap().unwrap();
    let released = repo.release(book.id, "member-1").await.unwrap().unwrap();
    assert_eq!(released.reserved, Reservation::default());
    assert_eq!(released.version, 2);

    // Free again, so anyone may take it
    let retaken = repo.reserve(book.id, "member-2").await.unwrap().unwrap();
    assert!(retaken.reserved.is_held_by("member-2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_reservations_have_one_winner() {
    let repo = BooksRepository::new(connect().await);
    let book = repo.insert(create("Great Expectations")).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.reserve(book.id, &format!("member-{}", i)).await.unwrap() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn reservation_holder_constraint_is_enforced() {
    let pool = connect().await;
    let repo = BooksRepository::new(pool.clone());
    let book = repo.insert(create("Hard Cash")).await.unwrap();

    let result = sqlx::query("UPDATE books SET reserved_status = TRUE WHERE id = $1")
        .bind(book.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn users_are_found_by_id() {
    let pool = connect().await;
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, username, password, admin) VALUES ($1, $2, $3, TRUE)")
        .bind(id)
        .bind(format!("admin-{}", id))
        .bind("hash")
        .execute(&pool)
        .await
        .unwrap();

    let repo = UsersRepository::new(pool);
    let user = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(user.admin);
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}
