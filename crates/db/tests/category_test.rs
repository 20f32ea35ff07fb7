//! Integration tests for Category repository.

mod common;

use sea_orm::DatabaseConnection;
use tally_core::ledger::CategoryType;
use tally_core::ordering::{OrderNode, OrderingError, TreeNode};
use tally_db::entities::transaction_categories;
use tally_db::repositories::{
    CategoryRepository, CreateCategoryInput, RepositoryError, UpdateCategoryInput,
};
use tally_shared::LimitsConfig;
use tally_shared::types::{CategoryId, UserId};

fn repo(db: &DatabaseConnection) -> CategoryRepository {
    CategoryRepository::new(db.clone(), LimitsConfig::default())
}

async fn create(
    repo: &CategoryRepository,
    user_id: UserId,
    name: &str,
    parent: Option<&transaction_categories::Model>,
) -> transaction_categories::Model {
    repo.create(CreateCategoryInput {
        user_id,
        name: name.to_string(),
        category_type: CategoryType::Expense,
        currency: "USD".to_string(),
        parent_id: parent.map(|p| CategoryId::from(p.id)),
    })
    .await
    .expect("Failed to create category")
}

/// `(name, order)` of active expense categories under `parent`.
async fn level(
    repo: &CategoryRepository,
    user_id: UserId,
    parent: Option<&transaction_categories::Model>,
) -> Vec<(String, i32)> {
    let parent_id = parent.map(|p| p.id);
    let mut level: Vec<(String, i32)> = repo
        .list_active(user_id)
        .await
        .expect("Failed to list categories")
        .into_iter()
        .filter(|c| c.parent_id == parent_id)
        .map(|c| (c.name, c.sort_order.unwrap_or(-1)))
        .collect();
    level.sort_by_key(|(_, order)| *order);
    level
}

fn named(entries: &[(&str, i32)]) -> Vec<(String, i32)> {
    entries.iter().map(|(n, o)| ((*n).to_string(), *o)).collect()
}

#[tokio::test]
async fn test_children_get_their_own_group() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    create(&repo, user, "Rent", None).await;
    let groceries = create(&repo, user, "Groceries", Some(&food)).await;
    create(&repo, user, "Dining", Some(&food)).await;

    assert_eq!(groceries.sort_order, Some(0));
    assert_eq!(level(&repo, user, None).await, named(&[("Food", 0), ("Rent", 1)]));
    assert_eq!(
        level(&repo, user, Some(&food)).await,
        named(&[("Groceries", 0), ("Dining", 1)])
    );
}

#[tokio::test]
async fn test_hierarchy_rules_on_create() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    let groceries = create(&repo, user, "Groceries", Some(&food)).await;

    let err = repo
        .create(CreateCategoryInput {
            user_id: user,
            name: "Too deep".to_string(),
            category_type: CategoryType::Expense,
            currency: "USD".to_string(),
            parent_id: Some(CategoryId::from(groceries.id)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ordering(OrderingError::ParentAlreadyNested(_))));

    let err = repo
        .create(CreateCategoryInput {
            user_id: user,
            name: "Salary".to_string(),
            category_type: CategoryType::Income,
            currency: "USD".to_string(),
            parent_id: Some(CategoryId::from(food.id)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ordering(OrderingError::ParentTypeMismatch { .. })));

    let stranger = common::create_user(&db).await;
    let err = repo
        .create(CreateCategoryInput {
            user_id: stranger,
            name: "Borrowed".to_string(),
            category_type: CategoryType::Expense,
            currency: "USD".to_string(),
            parent_id: Some(CategoryId::from(food.id)),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ordering(OrderingError::ParentNotFound(_))));
}

#[tokio::test]
async fn test_archive_detaches_children_to_root_end() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    create(&repo, user, "Rent", None).await;
    create(&repo, user, "Travel", None).await;
    create(&repo, user, "Groceries", Some(&food)).await;
    create(&repo, user, "Dining", Some(&food)).await;

    let archived = repo
        .archive(user, CategoryId::from(food.id))
        .await
        .expect("Failed to archive");

    assert_eq!(archived.sort_order, None);
    assert_eq!(archived.parent_id, None);
    assert_eq!(
        level(&repo, user, None).await,
        named(&[("Rent", 0), ("Travel", 1), ("Groceries", 2), ("Dining", 3)])
    );

    let back = repo
        .reactivate(user, CategoryId::from(food.id))
        .await
        .expect("Failed to reactivate");
    assert_eq!(back.sort_order, Some(4));
    assert_eq!(back.parent_id, None);
}

#[tokio::test]
async fn test_delete_nested_category_resequences_siblings() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    let groceries = create(&repo, user, "Groceries", Some(&food)).await;
    create(&repo, user, "Dining", Some(&food)).await;

    repo.delete(user, CategoryId::from(groceries.id))
        .await
        .expect("Failed to delete");

    assert_eq!(level(&repo, user, Some(&food)).await, named(&[("Dining", 0)]));
    let err = repo.find(user, CategoryId::from(groceries.id)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_parent_moves_children_to_root_end() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    create(&repo, user, "Rent", None).await;
    create(&repo, user, "Travel", None).await;
    let groceries = create(&repo, user, "Groceries", Some(&food)).await;
    create(&repo, user, "Dining", Some(&food)).await;

    repo.delete(user, CategoryId::from(food.id))
        .await
        .expect("Failed to delete");

    assert_eq!(
        level(&repo, user, None).await,
        named(&[("Rent", 0), ("Travel", 1), ("Groceries", 2), ("Dining", 3)])
    );
    let groceries = repo
        .find(user, CategoryId::from(groceries.id))
        .await
        .expect("Failed to find child");
    assert_eq!(groceries.parent_id, None);

    let err = repo.find(user, CategoryId::from(food.id)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_move_under_parent_and_back() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    let snacks = create(&repo, user, "Snacks", None).await;
    create(&repo, user, "Rent", None).await;

    let moved = repo
        .update(
            user,
            CategoryId::from(snacks.id),
            UpdateCategoryInput {
                name: None,
                parent_id: Some(Some(CategoryId::from(food.id))),
            },
        )
        .await
        .expect("Failed to move");
    assert_eq!(moved.parent_id, Some(food.id));
    assert_eq!(level(&repo, user, None).await, named(&[("Food", 0), ("Rent", 1)]));

    let err = repo
        .update(
            user,
            CategoryId::from(food.id),
            UpdateCategoryInput {
                name: None,
                parent_id: Some(Some(CategoryId::from(food.id))),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ordering(OrderingError::SelfParent(_))));

    repo.update(
        user,
        CategoryId::from(snacks.id),
        UpdateCategoryInput {
            name: Some("Treats".to_string()),
            parent_id: Some(None),
        },
    )
    .await
    .expect("Failed to move back");
    assert_eq!(
        level(&repo, user, None).await,
        named(&[("Food", 0), ("Rent", 1), ("Treats", 2)])
    );
    assert!(level(&repo, user, Some(&food)).await.is_empty());
}

#[tokio::test]
async fn test_reorder_tree() {
    let db = common::connect().await;
    let user = common::create_user(&db).await;
    let repo = repo(&db);

    let food = create(&repo, user, "Food", None).await;
    let rent = create(&repo, user, "Rent", None).await;
    let groceries = create(&repo, user, "Groceries", Some(&food)).await;

    // Groceries moves under Rent and Rent goes first.
    let nodes = [
        TreeNode {
            id: CategoryId::from(rent.id),
            order: 0,
            child_nodes: vec![OrderNode {
                id: CategoryId::from(groceries.id),
                order: 0,
            }],
        },
        TreeNode {
            id: CategoryId::from(food.id),
            order: 1,
            child_nodes: Vec::new(),
        },
    ];
    repo.reorder(user, CategoryType::Expense, &nodes)
        .await
        .expect("Failed to reorder");

    assert_eq!(level(&repo, user, None).await, named(&[("Rent", 0), ("Food", 1)]));
    assert_eq!(level(&repo, user, Some(&rent)).await, named(&[("Groceries", 0)]));

    let err = repo
        .reorder(user, CategoryType::Expense, &nodes[..1])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ordering(OrderingError::NodesMissing { .. })));
}
