mod common;

use common::{make_ingredient, make_recipe, make_user, test_db};
use recipebox::{
    shopping_list::{compute_shopping_list, render_shopping_list},
    store::relations::{self, RecipeRelation},
};

#[tokio::test]
async fn amounts_are_summed_across_cart_recipes() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let beet = make_ingredient(&db, "Beet", "g").await;
    let carrot = make_ingredient(&db, "Carrot", "g").await;

    let r1 = make_recipe(&db, &user, "Borscht", &[(beet.id, 10), (carrot.id, 20)]).await;
    let r2 = make_recipe(&db, &user, "Carrot soup", &[(carrot.id, 10)]).await;

    relations::add(&db, RecipeRelation::Cart, user.id, r1.id)
        .await
        .unwrap();
    relations::add(&db, RecipeRelation::Cart, user.id, r2.id)
        .await
        .unwrap();

    let items = compute_shopping_list(&db, user.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Beet");
    assert_eq!(items[0].total_amount, 10);
    assert_eq!(items[1].name, "Carrot");
    assert_eq!(items[1].total_amount, 30);

    let report = render_shopping_list(&items);
    assert_eq!(
        report,
        "Shopping list:\n\nBeet (g) — 10\nCarrot (g) — 30\n"
    );
}

#[tokio::test]
async fn empty_cart_yields_header_only() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;

    let items = compute_shopping_list(&db, user.id).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(render_shopping_list(&items), "Shopping list:\n\n");
}

#[tokio::test]
async fn same_name_different_unit_stays_separate() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let salt_g = make_ingredient(&db, "Salt", "g").await;
    let salt_pinch = make_ingredient(&db, "Salt", "pinch").await;

    let recipe = make_recipe(&db, &user, "Stew", &[(salt_g.id, 5), (salt_pinch.id, 2)]).await;
    relations::add(&db, RecipeRelation::Cart, user.id, recipe.id)
        .await
        .unwrap();

    let items = compute_shopping_list(&db, user.id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.name == "Salt"));
    assert_eq!(items[0].measurement_unit, "g");
    assert_eq!(items[1].measurement_unit, "pinch");
}

#[tokio::test]
async fn favorites_do_not_leak_into_the_list() {
    let db = test_db().await;
    let user = make_user(&db, "alice").await;
    let beet = make_ingredient(&db, "Beet", "g").await;
    let carrot = make_ingredient(&db, "Carrot", "g").await;

    let in_cart = make_recipe(&db, &user, "Borscht", &[(beet.id, 10)]).await;
    let only_favorited = make_recipe(&db, &user, "Salad", &[(carrot.id, 50)]).await;

    relations::add(&db, RecipeRelation::Cart, user.id, in_cart.id)
        .await
        .unwrap();
    relations::add(&db, RecipeRelation::Favorite, user.id, only_favorited.id)
        .await
        .unwrap();

    let items = compute_shopping_list(&db, user.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Beet");
}

#[tokio::test]
async fn the_list_is_scoped_to_one_user() {
    let db = test_db().await;
    let alice = make_user(&db, "alice").await;
    let bobby = make_user(&db, "bobby").await;
    let beet = make_ingredient(&db, "Beet", "g").await;

    let recipe = make_recipe(&db, &alice, "Borscht", &[(beet.id, 10)]).await;
    relations::add(&db, RecipeRelation::Cart, bobby.id, recipe.id)
        .await
        .unwrap();

    assert!(compute_shopping_list(&db, alice.id).await.unwrap().is_empty());
    assert_eq!(compute_shopping_list(&db, bobby.id).await.unwrap().len(), 1);
}
