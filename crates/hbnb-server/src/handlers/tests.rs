use crate::storage::{db, FileStorage};
use crate::{app, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use hbnb_core::{Entity, EntityKind, Storage};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    state: AppState,
    _dir: Option<tempfile::TempDir>,
}

impl TestApp {
    async fn file() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("file.json"));
        storage.reload().await.unwrap();
        Self {
            state: AppState::new(Arc::new(storage)),
            _dir: Some(dir),
        }
    }

    async fn db() -> Self {
        let storage = db::tests::memory_storage().await;
        Self {
            state: AppState::new(Arc::new(storage)),
            _dir: None,
        }
    }

    fn storage(&self) -> &dyn Storage {
        self.state.storage.as_ref()
    }

    async fn send(&self, method: &str, uri: &str, body: Body) -> (StatusCode, Value) {
        let response = app(self.state.clone())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Body::empty()).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Body::empty()).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Body::from(body.to_string())).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Body::from(body.to_string())).await
    }

    /// POST that must succeed; returns the new object's id
    async fn create(&self, uri: &str, body: Value) -> String {
        let (status, body) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// A state, one of its cities and a user
    async fn seed(&self) -> (String, String, String) {
        let state_id = self.create("/api/v1/states", json!({ "name": "Oregon" })).await;
        let city_id = self
            .create(
                &format!("/api/v1/states/{}/cities", state_id),
                json!({ "name": "Portland" }),
            )
            .await;
        let user_id = self
            .create(
                "/api/v1/users",
                json!({ "email": "ada@example.com", "password": "pw" }),
            )
            .await;
        (state_id, city_id, user_id)
    }
}

fn error(message: &str) -> Value {
    json!({ "error": message })
}

/// Runs each scenario once per storage backend
macro_rules! on_both_backends {
    ($($name:ident),* $(,)?) => {
        mod file_backend {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::TestApp::file().await).await
                }
            )*
        }

        mod db_backend {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::TestApp::db().await).await
                }
            )*
        }
    };
}

on_both_backends!(
    create_state_then_get_returns_same_object,
    create_validation_errors,
    crud_round_trip_on_plain_collections,
    update_ignores_identity_and_bumps_updated_at,
    update_checks_existence_before_body,
    delete_then_get_is_404,
    deleting_state_keeps_its_cities,
    deleting_amenity_unlinks_it_from_places,
    city_under_unknown_state_is_404,
    cities_are_listed_per_state,
    place_creation_checks_in_order,
    review_creation_checks_in_order,
    user_password_is_hashed_and_hidden,
    stats_counts_every_collection,
    place_amenity_links,
);

#[tokio::test]
async fn test_status_with_and_without_trailing_slash() {
    let app = TestApp::file().await;
    assert_eq!(
        app.get("/api/v1/status").await,
        (StatusCode::OK, json!({ "status": "OK" }))
    );
    assert_eq!(
        app.get("/api/v1/status/").await,
        (StatusCode::OK, json!({ "status": "OK" }))
    );
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::file().await;
    assert_eq!(
        app.get("/api/v1/nowhere").await,
        (StatusCode::NOT_FOUND, error("Not found"))
    );
}

async fn create_state_then_get_returns_same_object(app: TestApp) {
    let (status, created) = app
        .post("/api/v1/states", json!({ "name": "California" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "California");
    assert_eq!(created["__class__"], "State");
    let id = created["id"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
    assert_eq!(created["created_at"], created["updated_at"]);

    let (status, fetched) = app.get(&format!("/api/v1/states/{}/", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, listed) = app.get("/api/v1/states").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

async fn create_validation_errors(app: TestApp) {
    assert_eq!(
        app.post("/api/v1/states", json!({})).await,
        (StatusCode::BAD_REQUEST, error("Missing name"))
    );
    assert_eq!(
        app.send("POST", "/api/v1/states", Body::from("not json")).await,
        (StatusCode::BAD_REQUEST, error("Not a JSON"))
    );
    assert_eq!(
        app.post("/api/v1/amenities", json!(["name"])).await,
        (StatusCode::BAD_REQUEST, error("Not a JSON"))
    );
    assert_eq!(
        app.post("/api/v1/amenities", json!({ "name": "Pool", "colour": "blue" }))
            .await,
        (StatusCode::BAD_REQUEST, error("Unknown field colour"))
    );
    assert_eq!(
        app.post("/api/v1/users", json!({ "password": "pw" })).await,
        (StatusCode::BAD_REQUEST, error("Missing email"))
    );
    assert_eq!(
        app.post("/api/v1/users", json!({ "email": "a@b.c" })).await,
        (StatusCode::BAD_REQUEST, error("Missing password"))
    );
    assert_eq!(app.storage().count(None).await.unwrap(), 0);
}

async fn update_ignores_identity_and_bumps_updated_at(app: TestApp) {
    let (_, created) = app
        .post("/api/v1/amenities", json!({ "name": "Wifi" }))
        .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = app
        .put(
            &format!("/api/v1/amenities/{}", id),
            json!({ "id": "other", "created_at": "2001-01-01T00:00:00.000000", "name": "Pool" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["name"], "Pool");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert!(updated["updated_at"].as_str().unwrap() > created["updated_at"].as_str().unwrap());

    let (_, fetched) = app.get(&format!("/api/v1/amenities/{}", id)).await;
    assert_eq!(fetched, updated);
}

async fn update_checks_existence_before_body(app: TestApp) {
    assert_eq!(
        app.send("PUT", "/api/v1/states/missing", Body::from("not json"))
            .await,
        (StatusCode::NOT_FOUND, Value::Null)
    );

    let id = app.create("/api/v1/states", json!({ "name": "Utah" })).await;
    assert_eq!(
        app.send("PUT", &format!("/api/v1/states/{}", id), Body::from("not json"))
            .await,
        (StatusCode::BAD_REQUEST, error("Not a JSON"))
    );
    assert_eq!(
        app.put(&format!("/api/v1/states/{}", id), json!({ "name": 7 }))
            .await,
        (StatusCode::BAD_REQUEST, error("Invalid name"))
    );
}

async fn delete_then_get_is_404(app: TestApp) {
    let id = app.create("/api/v1/states", json!({ "name": "Ohio" })).await;
    let uri = format!("/api/v1/states/{}", id);

    assert_eq!(app.delete(&uri).await, (StatusCode::OK, json!({})));
    assert_eq!(app.get(&uri).await, (StatusCode::NOT_FOUND, Value::Null));
    assert_eq!(app.delete(&uri).await, (StatusCode::NOT_FOUND, Value::Null));
}

async fn crud_round_trip_on_plain_collections(app: TestApp) {
    let cases = [
        ("states", json!({ "name": "Utah" }), json!({ "name": "Nevada" }), "name"),
        ("amenities", json!({ "name": "Wifi" }), json!({ "name": "Sauna" }), "name"),
        (
            "users",
            json!({ "email": "ada@example.com", "password": "pw" }),
            json!({ "last_name": "Lovelace" }),
            "last_name",
        ),
    ];

    for (collection, create, change, field) in cases {
        let (status, created) = app.post(&format!("/api/v1/{}", collection), create).await;
        assert_eq!(status, StatusCode::CREATED, "{}", collection);
        let uri = format!("/api/v1/{}/{}", collection, created["id"].as_str().unwrap());

        let (status, listed) = app.get(&format!("/api/v1/{}", collection)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([created]));

        let (status, updated) = app.put(&uri, change.clone()).await;
        assert_eq!(status, StatusCode::OK, "{}", collection);
        assert_eq!(updated[field], change[field]);
        assert_eq!(updated["created_at"], created["created_at"]);
        assert!(updated["updated_at"].as_str().unwrap() > created["updated_at"].as_str().unwrap());
        assert_eq!(app.get(&uri).await, (StatusCode::OK, updated));

        assert_eq!(app.delete(&uri).await, (StatusCode::OK, json!({})));
        assert_eq!(app.get(&uri).await, (StatusCode::NOT_FOUND, Value::Null));
        assert_eq!(app.delete(&uri).await, (StatusCode::NOT_FOUND, Value::Null));
        assert_eq!(
            app.get(&format!("/api/v1/{}", collection)).await,
            (StatusCode::OK, json!([]))
        );
    }
}

async fn deleting_state_keeps_its_cities(app: TestApp) {
    let (state_id, city_id, _) = app.seed().await;

    assert_eq!(
        app.delete(&format!("/api/v1/states/{}", state_id)).await,
        (StatusCode::OK, json!({}))
    );
    assert_eq!(
        app.get(&format!("/api/v1/states/{}", state_id)).await,
        (StatusCode::NOT_FOUND, Value::Null)
    );

    let (status, city) = app.get(&format!("/api/v1/cities/{}", city_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(city["state_id"], state_id.as_str());
    assert_eq!(app.storage().count(Some(EntityKind::City)).await.unwrap(), 1);
}

async fn deleting_amenity_unlinks_it_from_places(app: TestApp) {
    let (_, city_id, user_id) = app.seed().await;
    let place_id = app
        .create(
            &format!("/api/v1/cities/{}/places", city_id),
            json!({ "user_id": user_id, "name": "Cabin" }),
        )
        .await;
    let wifi = app.create("/api/v1/amenities", json!({ "name": "Wifi" })).await;
    let pool = app.create("/api/v1/amenities", json!({ "name": "Pool" })).await;
    for amenity_id in [&wifi, &pool] {
        let link = format!("/api/v1/places/{}/amenities/{}", place_id, amenity_id);
        assert_eq!(app.post(&link, json!({})).await.0, StatusCode::CREATED);
    }

    assert_eq!(
        app.delete(&format!("/api/v1/amenities/{}", wifi)).await,
        (StatusCode::OK, json!({}))
    );

    let (_, place) = app.get(&format!("/api/v1/places/{}", place_id)).await;
    assert_eq!(place["amenity_ids"], json!([pool]));
    let (_, listed) = app
        .get(&format!("/api/v1/places/{}/amenities", place_id))
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], pool.as_str());
}

async fn city_under_unknown_state_is_404(app: TestApp) {
    assert_eq!(
        app.post("/api/v1/states/missing/cities", json!({})).await,
        (StatusCode::NOT_FOUND, Value::Null)
    );
    assert_eq!(
        app.get("/api/v1/states/missing/cities").await.0,
        StatusCode::NOT_FOUND
    );
}

async fn cities_are_listed_per_state(app: TestApp) {
    let (state_id, city_id, _) = app.seed().await;
    let other = app.create("/api/v1/states", json!({ "name": "Idaho" })).await;
    app.create(
        &format!("/api/v1/states/{}/cities", other),
        json!({ "name": "Boise", "state_id": state_id }),
    )
    .await;

    let (status, cities) = app.get(&format!("/api/v1/states/{}/cities", state_id)).await;
    assert_eq!(status, StatusCode::OK);
    let cities = cities.as_array().unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0]["id"], city_id.as_str());
    assert_eq!(cities[0]["state_id"], state_id.as_str());
}

async fn place_creation_checks_in_order(app: TestApp) {
    let (_, city_id, user_id) = app.seed().await;
    let places = format!("/api/v1/cities/{}/places", city_id);

    assert_eq!(
        app.post("/api/v1/cities/missing/places", json!({})).await,
        (StatusCode::NOT_FOUND, Value::Null)
    );
    assert_eq!(
        app.send("POST", &places, Body::from("nope")).await,
        (StatusCode::BAD_REQUEST, error("Not a JSON"))
    );
    assert_eq!(
        app.post(&places, json!({ "name": "Loft" })).await,
        (StatusCode::BAD_REQUEST, error("Missing user_id"))
    );
    assert_eq!(
        app.post(&places, json!({ "user_id": "ghost", "name": "Loft" }))
            .await,
        (StatusCode::NOT_FOUND, Value::Null)
    );
    assert_eq!(
        app.post(&places, json!({ "user_id": user_id })).await,
        (StatusCode::BAD_REQUEST, error("Missing name"))
    );

    let (status, place) = app
        .post(
            &places,
            json!({ "user_id": user_id, "name": "Loft", "number_rooms": 2, "latitude": 45.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(place["city_id"], city_id.as_str());
    assert_eq!(place["user_id"], user_id.as_str());
    assert_eq!(place["number_rooms"], 2);
    assert_eq!(place["max_guest"], 0);
    assert_eq!(place["latitude"], 45.5);

    let (_, listed) = app.get(&places).await;
    assert_eq!(listed, json!([place]));
}

async fn review_creation_checks_in_order(app: TestApp) {
    let (_, city_id, user_id) = app.seed().await;
    let place_id = app
        .create(
            &format!("/api/v1/cities/{}/places", city_id),
            json!({ "user_id": user_id, "name": "Loft" }),
        )
        .await;
    let reviews = format!("/api/v1/places/{}/reviews", place_id);

    assert_eq!(
        app.post("/api/v1/places/missing/reviews", json!({})).await,
        (StatusCode::NOT_FOUND, Value::Null)
    );
    assert_eq!(
        app.post(&reviews, json!({ "text": "Nice" })).await,
        (StatusCode::BAD_REQUEST, error("Missing user_id"))
    );
    assert_eq!(
        app.post(&reviews, json!({ "user_id": "ghost", "text": "Nice" }))
            .await,
        (StatusCode::NOT_FOUND, Value::Null)
    );
    assert_eq!(
        app.post(&reviews, json!({ "user_id": user_id })).await,
        (StatusCode::BAD_REQUEST, error("Missing text"))
    );

    let review_id = app
        .create(&reviews, json!({ "user_id": user_id, "text": "Nice" }))
        .await;
    let (_, updated) = app
        .put(
            &format!("/api/v1/reviews/{}", review_id),
            json!({ "text": "Great", "place_id": "elsewhere" }),
        )
        .await;
    assert_eq!(updated["text"], "Great");
    assert_eq!(updated["place_id"], place_id.as_str());

    let (_, listed) = app.get(&reviews).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

async fn user_password_is_hashed_and_hidden(app: TestApp) {
    let (status, user) = app
        .post(
            "/api/v1/users",
            json!({ "email": "ada@example.com", "password": "hunter2", "first_name": "Ada" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(user.get("password").is_none());
    assert_eq!(user["first_name"], "Ada");

    let id = user["id"].as_str().unwrap();
    let stored = match app.storage().get(EntityKind::User, id).await.unwrap() {
        Some(Entity::User(user)) => user.password,
        other => panic!("unexpected {:?}", other),
    };
    assert!(stored.starts_with("$argon2"));

    let (_, updated) = app
        .put(&format!("/api/v1/users/{}", id), json!({ "password": "changed" }))
        .await;
    assert!(updated.get("password").is_none());
    match app.storage().get(EntityKind::User, id).await.unwrap() {
        Some(Entity::User(user)) => {
            assert!(user.password.starts_with("$argon2"));
            assert_ne!(user.password, stored);
        }
        other => panic!("unexpected {:?}", other),
    }
}

async fn stats_counts_every_collection(app: TestApp) {
    app.seed().await;
    app.create("/api/v1/amenities", json!({ "name": "Wifi" })).await;
    app.create("/api/v1/amenities", json!({ "name": "Pool" })).await;

    assert_eq!(
        app.get("/api/v1/stats").await,
        (
            StatusCode::OK,
            json!({
                "states": 1,
                "cities": 1,
                "amenities": 2,
                "users": 1,
                "places": 0,
                "reviews": 0
            })
        )
    );
}

async fn place_amenity_links(app: TestApp) {
    let (_, city_id, user_id) = app.seed().await;
    let place_id = app
        .create(
            &format!("/api/v1/cities/{}/places", city_id),
            json!({ "user_id": user_id, "name": "Loft" }),
        )
        .await;
    let wifi = app.create("/api/v1/amenities", json!({ "name": "Wifi" })).await;
    let link = format!("/api/v1/places/{}/amenities/{}", place_id, wifi);

    let (status, linked) = app.post(&link, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(linked["id"], wifi.as_str());
    assert_eq!(app.post(&link, json!({})).await.0, StatusCode::OK);

    let (_, listed) = app
        .get(&format!("/api/v1/places/{}/amenities", place_id))
        .await;
    assert_eq!(listed, json!([linked]));

    let (_, place) = app.get(&format!("/api/v1/places/{}", place_id)).await;
    assert_eq!(place["amenity_ids"], json!([wifi]));

    assert_eq!(app.delete(&link).await, (StatusCode::OK, json!({})));
    assert_eq!(app.delete(&link).await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        app.post(&format!("/api/v1/places/{}/amenities/missing", place_id), json!({}))
            .await
            .0,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_file_backend_persists_across_reload() {
    let app = TestApp::file().await;
    let id = app.create("/api/v1/states", json!({ "name": "Maine" })).await;

    app.storage().reload().await.unwrap();
    let (status, state) = app.get(&format!("/api/v1/states/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["name"], "Maine");
}

#[tokio::test]
async fn test_db_backend_serves_same_api() {
    let app = TestApp::db().await;
    let (_, city_id, user_id) = app.seed().await;
    let place_id = app
        .create(
            &format!("/api/v1/cities/{}/places", city_id),
            json!({ "user_id": user_id, "name": "Loft", "price_by_night": 80 }),
        )
        .await;

    let (status, place) = app.get(&format!("/api/v1/places/{}", place_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(place["price_by_night"], 80);
    assert_eq!(place["created_at"], place["updated_at"]);

    let (status, updated) = app
        .put(
            &format!("/api/v1/places/{}", place_id),
            json!({ "name": "Attic", "city_id": "elsewhere" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Attic");
    assert_eq!(updated["city_id"], city_id.as_str());

    assert_eq!(
        app.delete(&format!("/api/v1/places/{}", place_id)).await,
        (StatusCode::OK, json!({}))
    );
    assert_eq!(app.storage().count(Some(EntityKind::Place)).await.unwrap(), 0);
    assert_eq!(app.storage().count(None).await.unwrap(), 3);
}
