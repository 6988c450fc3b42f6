mod common;

use common::{count_rows, make_ingredient, make_recipe, make_user, test_db};
use recipebox::{
    store::relations::{self, RecipeRelation},
    AppError,
};

#[tokio::test]
async fn second_add_fails_and_one_row_persists() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let flour = make_ingredient(&db, "Flour", "g").await;
    let recipe = make_recipe(&db, &user, "Bread", &[(flour.id, 500)]).await;

    for relation in [RecipeRelation::Favorite, RecipeRelation::Cart] {
        let added = relations::add(&db, relation, user.id, recipe.id).await.unwrap();
        assert_eq!(added.id, recipe.id);

        let err = relations::add(&db, relation, user.id, recipe.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    assert_eq!(count_rows(&db, "favorites").await, 1);
    assert_eq!(count_rows(&db, "shopping_cart").await, 1);
}

#[tokio::test]
async fn remove_without_add_is_not_found() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let flour = make_ingredient(&db, "Flour", "g").await;
    let recipe = make_recipe(&db, &user, "Bread", &[(flour.id, 500)]).await;

    for relation in [RecipeRelation::Favorite, RecipeRelation::Cart] {
        let err = relations::remove(&db, relation, user.id, recipe.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

#[tokio::test]
async fn add_remove_add_succeeds_and_leaves_one_row() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let flour = make_ingredient(&db, "Flour", "g").await;
    let recipe = make_recipe(&db, &user, "Bread", &[(flour.id, 500)]).await;

    relations::add(&db, RecipeRelation::Favorite, user.id, recipe.id)
        .await
        .unwrap();
    relations::remove(&db, RecipeRelation::Favorite, user.id, recipe.id)
        .await
        .unwrap();
    relations::add(&db, RecipeRelation::Favorite, user.id, recipe.id)
        .await
        .unwrap();

    assert_eq!(count_rows(&db, "favorites").await, 1);
}

#[tokio::test]
async fn add_to_missing_recipe_is_not_found() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;

    let err = relations::add(&db, RecipeRelation::Cart, user.id, 9999)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn subscribing_to_yourself_always_fails() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let other = make_user(&db, "bobby").await;

    let err = relations::subscribe(&db, user.id, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::SelfReference(_)));

    // Still rejected regardless of existing subscriptions.
    relations::subscribe(&db, user.id, other.id).await.unwrap();
    let err = relations::subscribe(&db, user.id, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::SelfReference(_)));
}

#[tokio::test]
async fn subscription_toggle_contract() {
    let db = test_db().await;
    let follower = make_user(&db, "alice").await;
    let author = make_user(&db, "bobby").await;

    let subscribed_to = relations::subscribe(&db, follower.id, author.id)
        .await
        .unwrap();
    assert_eq!(subscribed_to.id, author.id);
    assert!(relations::is_subscribed(&db, follower.id, author.id)
        .await
        .unwrap());

    let err = relations::subscribe(&db, follower.id, author.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));
    assert_eq!(count_rows(&db, "subscriptions").await, 1);

    relations::unsubscribe(&db, follower.id, author.id)
        .await
        .unwrap();
    let err = relations::unsubscribe(&db, follower.id, author.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(count_rows(&db, "subscriptions").await, 0);
}

#[tokio::test]
async fn subscribing_to_missing_author_is_not_found() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;

    let err = relations::subscribe(&db, user.id, 4242).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
