use autoplaza::accounts::services::{register, Registration};
use autoplaza::auth::extractors::Identity;
use autoplaza::catalog::dto::SearchQuery;
use autoplaza::listings::services as listings;
use autoplaza::moderation::engine;
use autoplaza::store::{
    Account, AccountStore, CatalogFilter, FuelType, ListingAttributes, ListingStore, LocalStore,
    Profile, RoleIntent, Transmission,
};
use time::OffsetDateTime;
use uuid::Uuid;

fn identity(account: &Account) -> Identity {
    Identity {
        id: account.id,
        tier: account.tier,
    }
}

async fn seller(store: &LocalStore) -> Identity {
    let account = register(
        store,
        Registration {
            email: "vendedor@test.com".into(),
            password: "hunter2hunter2".into(),
            full_name: "Juan Vendedor".into(),
            phone: "3001234567".into(),
            id_number: "1234567890".into(),
            role_intent: RoleIntent::Seller,
        },
    )
    .await
    .unwrap();
    identity(&account)
}

fn vehicle(
    brand: &str,
    model: &str,
    year: i32,
    price: i64,
    transmission: Transmission,
    fuel_type: FuelType,
) -> ListingAttributes {
    ListingAttributes {
        brand: brand.into(),
        model: model.into(),
        year,
        price,
        description: format!("{brand} {model} {year}"),
        mileage: 30_000,
        transmission,
        fuel_type,
    }
}

/// Create, submit and approve a listing so it is publicly visible.
async fn approved(
    store: &LocalStore,
    owner: &Identity,
    attrs: ListingAttributes,
) -> autoplaza::store::Listing {
    let listing = listings::create(store, owner, attrs, vec![]).await.unwrap();
    engine::submit_for_sale(store, owner, listing.id).await.unwrap();
    engine::approve_listing(store, Uuid::new_v4(), listing.id)
        .await
        .unwrap()
}

async fn seeded_store() -> (LocalStore, Identity) {
    let store = LocalStore::ephemeral();
    let owner = seller(&store).await;

    approved(
        &store,
        &owner,
        vehicle(
            "Toyota",
            "Corolla",
            2020,
            85_000_000,
            Transmission::Automatic,
            FuelType::Gasoline,
        ),
    )
    .await;
    approved(
        &store,
        &owner,
        vehicle(
            "Mazda",
            "CX-5",
            2021,
            120_000_000,
            Transmission::Automatic,
            FuelType::Gasoline,
        ),
    )
    .await;
    approved(
        &store,
        &owner,
        vehicle(
            "Renault",
            "Duster",
            2022,
            95_000_000,
            Transmission::Manual,
            FuelType::Hybrid,
        ),
    )
    .await;

    (store, owner)
}

#[tokio::test]
async fn empty_search_equals_public_catalog_in_order() {
    let (store, _) = seeded_store().await;

    let catalog = store.public_catalog().await.unwrap();
    let searched = store
        .search_catalog(&SearchQuery::default().into_filter())
        .await
        .unwrap();

    assert_eq!(catalog.len(), 3);
    let catalog_ids: Vec<_> = catalog.iter().map(|l| l.id).collect();
    let searched_ids: Vec<_> = searched.iter().map(|l| l.id).collect();
    assert_eq!(catalog_ids, searched_ids);

    // Newest-created first.
    for pair in catalog.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn brand_and_year_range_narrow_the_result() {
    let (store, _) = seeded_store().await;

    let filter = CatalogFilter {
        brand: Some("Toyota".into()),
        min_year: Some(2019),
        max_year: Some(2021),
        ..Default::default()
    };
    let hits = store.search_catalog(&filter).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].brand, "Toyota");
    assert_eq!(hits[0].year, 2020);
}

#[tokio::test]
async fn exact_filters_on_transmission_and_fuel() {
    let (store, _) = seeded_store().await;

    let manual = store
        .search_catalog(&CatalogFilter {
            transmission: Some(Transmission::Manual),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].brand, "Renault");

    let hybrid = store
        .search_catalog(&CatalogFilter {
            fuel_type: Some(FuelType::Hybrid),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hybrid.len(), 1);
    assert_eq!(hybrid[0].model, "Duster");
}

#[tokio::test]
async fn price_range_is_inclusive() {
    let (store, _) = seeded_store().await;

    let filter = CatalogFilter {
        min_price: Some(85_000_000),
        max_price: Some(95_000_000),
        ..Default::default()
    };
    let hits = store.search_catalog(&filter).await.unwrap();
    let brands: Vec<_> = hits.iter().map(|l| l.brand.as_str()).collect();
    assert_eq!(hits.len(), 2);
    assert!(brands.contains(&"Toyota"));
    assert!(brands.contains(&"Renault"));
}

#[tokio::test]
async fn search_never_surfaces_unmoderated_listings() {
    let (store, owner) = seeded_store().await;

    // A draft and a pending listing that both match the filter by content.
    let draft = listings::create(
        &store,
        &owner,
        vehicle(
            "Toyota",
            "Hilux",
            2020,
            150_000_000,
            Transmission::Manual,
            FuelType::Diesel,
        ),
        vec![],
    )
    .await
    .unwrap();
    let pending = listings::create(
        &store,
        &owner,
        vehicle(
            "Toyota",
            "Prado",
            2020,
            200_000_000,
            Transmission::Automatic,
            FuelType::Diesel,
        ),
        vec![],
    )
    .await
    .unwrap();
    engine::submit_for_sale(&store, &owner, pending.id)
        .await
        .unwrap();

    let hits = store
        .search_catalog(&CatalogFilter {
            brand: Some("toyota".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].model, "Corolla");
    assert!(hits.iter().all(|l| l.id != draft.id && l.id != pending.id));
}

#[tokio::test]
async fn owner_management_view_sees_every_status() {
    let (store, owner) = seeded_store().await;

    let draft = listings::create(
        &store,
        &owner,
        vehicle(
            "Nissan",
            "Versa",
            2020,
            55_000_000,
            Transmission::Automatic,
            FuelType::Gasoline,
        ),
        vec![],
    )
    .await
    .unwrap();

    let mine = listings::mine(&store, &owner).await.unwrap();
    assert_eq!(mine.len(), 4);
    assert!(mine.iter().any(|l| l.id == draft.id));

    // Another account sees none of them through its own view.
    let other = register(
        &store,
        Registration {
            email: "comprador@test.com".into(),
            password: "hunter2hunter2".into(),
            full_name: "Maria Compradora".into(),
            phone: "3009876543".into(),
            id_number: "0987654321".into(),
            role_intent: RoleIntent::Buyer,
        },
    )
    .await
    .unwrap();
    let theirs = listings::mine(&store, &identity(&other)).await.unwrap();
    assert!(theirs.is_empty());
}

#[tokio::test]
async fn catalog_ignores_owner_account_state() {
    let (store, owner) = seeded_store().await;

    // The seeded owner was never account-approved, yet all three approved
    // listings are public: the two gates are independent.
    let account = store.account_by_id(owner.id).await.unwrap().unwrap();
    assert!(!account.is_approved);
    assert_eq!(store.public_catalog().await.unwrap().len(), 3);
}

#[tokio::test]
async fn admin_account_views_are_ordered_newest_first() {
    let store = LocalStore::ephemeral();
    let _ = seller(&store).await;

    let admin = Account::new_admin(
        "admin@autoplaza.test".into(),
        "hash".into(),
        Profile {
            full_name: "Carlos Administrador".into(),
            phone: "3101234567".into(),
            id_number: "ADM-001".into(),
        },
        OffsetDateTime::now_utc(),
    );
    store.insert_account(admin).await.unwrap();

    let pending = store.pending_accounts().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].email, "vendedor@test.com");

    let all = store.all_accounts().await.unwrap();
    assert_eq!(all.len(), 2);
    for pair in all.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}
