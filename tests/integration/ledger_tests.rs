//! Checkout ledger tests against a real database

use library_server::{
    config::AuthConfig,
    error::AppError,
    models::{
        book::BookInput,
        user::{LoginRequest, Role, SignupRequest},
    },
    repository::Repository,
    services::Services,
};
use sqlx::PgPool;

fn services(pool: PgPool) -> Services {
    let auth = AuthConfig {
        jwt_secret: "ledger-test-secret".to_string(),
        token_ttl_days: 7,
        admin_invite_code: None,
    };
    Services::new(Repository::new(pool), &auth).expect("services")
}

async fn patron(services: &Services, name: &str) -> i32 {
    let (user, _) = services
        .auth
        .signup(SignupRequest {
            username: Some(name.to_string()),
            email: Some(format!("{}@example.com", name)),
            password: Some("correct horse".to_string()),
            role: None,
            admin_invite_code: None,
        })
        .await
        .expect("signup");
    user.id
}

async fn book(services: &Services, title: &str, copies: i32) -> i32 {
    services
        .catalog
        .create_book(BookInput {
            title: title.to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: None,
            description: None,
            page_count: None,
            copies,
        })
        .await
        .expect("create book")
        .id
}

async fn available(services: &Services, book_id: i32) -> i32 {
    services
        .catalog
        .get_book(book_id)
        .await
        .expect("get book")
        .available_copies
}

async fn active_rows(pool: &PgPool, user_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM active_checkouts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("count")
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_fourth_checkout_hits_limit(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "reader_one").await;

    for title in ["A Wizard of Earthsea", "The Tombs of Atuan", "The Farthest Shore"] {
        let id = book(&services, title, 2).await;
        services.checkouts.checkout(user, id).await.expect("checkout");
    }
    let fourth = book(&services, "Tehanu", 2).await;

    let err = services.checkouts.checkout(user, fourth).await.unwrap_err();
    assert!(matches!(err, AppError::LimitReached(3)));
    assert_eq!(active_rows(&pool, user).await, 3);
    assert_eq!(available(&services, fourth).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_checkout_rejected(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "reader_two").await;
    let id = book(&services, "The Dispossessed", 3).await;

    services.checkouts.checkout(user, id).await.expect("first checkout");
    let err = services.checkouts.checkout(user, id).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateCheckout));
    assert_eq!(available(&services, id).await, 2);
    assert_eq!(active_rows(&pool, user).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_last_copy_unavailable_to_others(pool: PgPool) {
    let services = services(pool.clone());
    let alice = patron(&services, "alice").await;
    let bob = patron(&services, "bob").await;
    let id = book(&services, "The Lathe of Heaven", 1).await;

    services.checkouts.checkout(alice, id).await.expect("alice checkout");
    let err = services.checkouts.checkout(bob, id).await.unwrap_err();

    assert!(matches!(err, AppError::Unavailable));
    assert_eq!(available(&services, id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_missing_book_is_not_found(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "reader_three").await;

    let err = services.checkouts.checkout(user, 9999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_return_moves_checkout_to_history(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "reader_four").await;
    let id = book(&services, "The Word for World Is Forest", 1).await;

    let checkout = services.checkouts.checkout(user, id).await.expect("checkout");
    let history = services.checkouts.return_book(user, id).await.expect("return");

    assert_eq!(history.checkout_date, checkout.checkout_date);
    assert!(history.return_date >= history.checkout_date);
    assert_eq!(active_rows(&pool, user).await, 0);
    assert_eq!(available(&services, id).await, 1);

    let entries = services.checkouts.list_checkouts(user).await.expect("list");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].return_date.is_some());
    assert_eq!(entries[0].title.as_deref(), Some("The Word for World Is Forest"));

    // A second return has nothing to close
    let err = services.checkouts.return_book(user, id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_checkouts_of_last_copy(pool: PgPool) {
    let services = services(pool.clone());
    let alice = patron(&services, "racer_a").await;
    let bob = patron(&services, "racer_b").await;
    let id = book(&services, "Always Coming Home", 1).await;

    let (a, b) = tokio::join!(
        services.checkouts.checkout(alice, id),
        services.checkouts.checkout(bob, id)
    );

    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    let loser = if a.is_ok() { b } else { a };
    assert!(matches!(loser, Err(AppError::Unavailable)));
    assert_eq!(available(&services, id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_checkouts_respect_limit(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "greedy").await;
    let mut ids = Vec::new();
    for title in ["Rocannon's World", "Planet of Exile", "City of Illusions", "Malafrena"] {
        ids.push(book(&services, title, 1).await);
    }

    let results = checkout_all(&services, user, &ids).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    assert_eq!(active_rows(&pool, user).await, 3);
}

async fn checkout_all(
    services: &Services,
    user: i32,
    ids: &[i32],
) -> Vec<Result<(), AppError>> {
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let services = services.clone();
            tokio::spawn(async move { services.checkouts.checkout(user, id).await.map(|_| ()) })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.expect("task"));
    }
    results
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_signup_then_login(pool: PgPool) {
    let services = services(pool.clone());
    let (signed_up, _) = services
        .auth
        .signup(SignupRequest {
            username: Some("alice01".to_string()),
            email: Some("alice@example.com".to_string()),
            password: Some("password123".to_string()),
            role: None,
            admin_invite_code: None,
        })
        .await
        .expect("signup");
    assert_eq!(signed_up.role, Role::Patron);

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
        .bind(signed_up.id)
        .fetch_one(&pool)
        .await
        .expect("hash");
    assert_ne!(stored, "password123");

    for identity in ["alice01", "alice@example.com"] {
        let (user, token) = services
            .auth
            .login(LoginRequest {
                username_or_email: Some(identity.to_string()),
                password: Some("password123".to_string()),
            })
            .await
            .expect("login");
        assert_eq!(user.id, signed_up.id);

        let claims = services.auth.verify_token(&token).expect("claims");
        assert_eq!(claims.id, signed_up.id);
        assert_eq!(claims.role, Role::Patron);
    }

    let err = services
        .auth
        .login(LoginRequest {
            username_or_email: Some("alice01".to_string()),
            password: Some("wrong password".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_identity(pool: PgPool) {
    let services = services(pool.clone());
    patron(&services, "taken").await;

    let err = services
        .auth
        .signup(SignupRequest {
            username: Some("other".to_string()),
            email: Some("taken@example.com".to_string()),
            password: Some("correct horse".to_string()),
            role: None,
            admin_invite_code: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateIdentity(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_update_recomputes_available_copies(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "holder").await;
    let id = book(&services, "Lavinia", 2).await;
    services.checkouts.checkout(user, id).await.expect("checkout");

    let input = |copies| BookInput {
        title: "Lavinia".to_string(),
        author: "Ursula K. Le Guin".to_string(),
        isbn: Some("9780151014248".to_string()),
        description: None,
        page_count: Some(279),
        copies,
    };

    let updated = services.catalog.update_book(id, input(5)).await.expect("update");
    assert_eq!(updated.total_copies, 5);
    assert_eq!(updated.available_copies, 4);
    assert_eq!(updated.copies, 4);

    let err = services.catalog.update_book(id, input(0)).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_delete_blocked_while_on_loan(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "borrower").await;
    let id = book(&services, "Searoad", 1).await;
    services.checkouts.checkout(user, id).await.expect("checkout");

    let err = services.catalog.delete_book(id).await.unwrap_err();
    assert!(matches!(err, AppError::BookOnLoan(_)));

    services.checkouts.return_book(user, id).await.expect("return");
    services.catalog.delete_book(id).await.expect("delete");

    // History survives the book
    let entries = services.checkouts.list_checkouts(user).await.expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_listing_never_shows_a_checkout_twice(pool: PgPool) {
    let services = services(pool.clone());
    let user = patron(&services, "cycler").await;
    let id = book(&services, "The Left Hand of Darkness", 1).await;

    let writer = {
        let services = services.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                services.checkouts.checkout(user, id).await.expect("checkout");
                services.checkouts.return_book(user, id).await.expect("return");
            }
        })
    };

    while !writer.is_finished() {
        let entries = services.checkouts.list_checkouts(user).await.expect("list");
        let active: Vec<_> = entries.iter().filter(|e| e.return_date.is_none()).collect();

        assert!(active.len() <= 1);
        for entry in &active {
            assert!(
                !entries
                    .iter()
                    .any(|e| e.return_date.is_some() && e.checkout_date == entry.checkout_date),
                "checkout listed as both active and returned"
            );
        }
        // Active rows come first
        if let Some(first_returned) = entries.iter().position(|e| e.return_date.is_some()) {
            assert!(entries[first_returned..].iter().all(|e| e.return_date.is_some()));
        }
    }

    writer.await.expect("writer");
    let entries = services.checkouts.list_checkouts(user).await.expect("list");
    assert_eq!(entries.len(), 200);
}
