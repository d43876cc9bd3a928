//! SQLite database backend
//!
//! One open transaction is the session: `new` and `delete` write into it,
//! `save` commits it and `close` rolls it back. A session is opened lazily
//! by the first call that needs one.
//!
//! Parent ids on cities, places and reviews are plain columns: deleting a
//! parent leaves its children in place, as the file backend does. Only the
//! `place_amenity` link table carries foreign keys, and its rows go away
//! with either side.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use hbnb_core::{
    Amenity, BaseModel, City, Entity, EntityKind, ObjectTable, Place, Result, Review, State,
    Storage, StorageError, User,
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS states (
        id TEXT PRIMARY KEY NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cities (
        id TEXT PRIMARY KEY NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        state_id TEXT NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS amenities (
        id TEXT PRIMARY KEY NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        email TEXT NOT NULL,
        password TEXT NOT NULL,
        first_name TEXT,
        last_name TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS places (
        id TEXT PRIMARY KEY NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        city_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        number_rooms INTEGER NOT NULL DEFAULT 0,
        number_bathrooms INTEGER NOT NULL DEFAULT 0,
        max_guest INTEGER NOT NULL DEFAULT 0,
        price_by_night INTEGER NOT NULL DEFAULT 0,
        latitude REAL,
        longitude REAL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id TEXT PRIMARY KEY NOT NULL,
        created_at DATETIME NOT NULL,
        updated_at DATETIME NOT NULL,
        place_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        text TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS place_amenity (
        place_id TEXT NOT NULL
            REFERENCES places(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
        amenity_id TEXT NOT NULL
            REFERENCES amenities(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
        PRIMARY KEY (place_id, amenity_id)
    )
    "#,
];

/// Children before parents
const DROP_ORDER: &[&str] = &[
    "place_amenity",
    "reviews",
    "places",
    "users",
    "amenities",
    "cities",
    "states",
];

type Session = Transaction<'static, Sqlite>;

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

pub struct DbStorage {
    pool: SqlitePool,
    drop_on_reload: bool,
    session: Mutex<Option<Session>>,
}

impl DbStorage {
    /// Open a pool on `url`, creating the database file if needed.
    ///
    /// With `drop_on_reload` set, every `reload` wipes the schema first.
    pub async fn connect(url: &str, max_connections: u32, drop_on_reload: bool) -> Result<Self> {
        info!("Opening SQLite database at: {}", url);

        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(backend)?;

        Ok(Self::from_pool(pool, drop_on_reload))
    }

    pub fn from_pool(pool: SqlitePool, drop_on_reload: bool) -> Self {
        Self {
            pool,
            drop_on_reload,
            session: Mutex::new(None),
        }
    }

    /// The open session, beginning one if there is none
    async fn open_session<'a>(&self, slot: &'a mut Option<Session>) -> Result<&'a mut Session> {
        let tx = match slot.take() {
            Some(tx) => tx,
            None => {
                debug!("Beginning database session");
                self.pool.begin().await.map_err(backend)?
            }
        };
        Ok(slot.insert(tx))
    }

    async fn rollback(slot: &mut Option<Session>) -> Result<()> {
        if let Some(tx) = slot.take() {
            tx.rollback().await.map_err(backend)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for DbStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<ObjectTable> {
        let mut slot = self.session.lock().await;
        let tx = self.open_session(&mut slot).await?;

        let kinds: &[EntityKind] = match kind {
            Some(ref kind) => std::slice::from_ref(kind),
            None => &EntityKind::ALL,
        };
        let mut table = ObjectTable::new();
        for kind in kinds {
            table.extend(fetch(&mut **tx, *kind, None).await?);
        }
        Ok(table)
    }

    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let mut slot = self.session.lock().await;
        let tx = self.open_session(&mut slot).await?;
        Ok(fetch(&mut **tx, kind, Some(id)).await?.into_iter().next())
    }

    async fn new(&self, entity: Entity) -> Result<()> {
        let mut slot = self.session.lock().await;
        let tx = self.open_session(&mut slot).await?;
        upsert(&mut **tx, &entity).await
    }

    async fn save(&self) -> Result<()> {
        let mut slot = self.session.lock().await;
        if let Some(tx) = slot.take() {
            tx.commit().await.map_err(backend)?;
            debug!("Committed database session");
        }
        Ok(())
    }

    async fn delete(&self, entity: Option<&Entity>) -> Result<()> {
        let Some(entity) = entity else {
            return Ok(());
        };
        let mut slot = self.session.lock().await;
        let tx = self.open_session(&mut slot).await?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", entity.kind().collection());
        sqlx::query(&sql)
            .bind(entity.id())
            .execute(&mut **tx)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        let mut slot = self.session.lock().await;
        Self::rollback(&mut slot).await?;

        if self.drop_on_reload {
            info!("Dropping all tables");
            for table in DROP_ORDER {
                sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                    .execute(&self.pool)
                    .await
                    .map_err(backend)?;
            }
        }

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(backend)?;
        }
        info!("Database schema ready");

        self.open_session(&mut slot).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut slot = self.session.lock().await;
        Self::rollback(&mut slot).await
    }
}

async fn rows<T>(conn: &mut SqliteConnection, sql: &str, id: Option<&str>) -> Result<Vec<T>>
where
    T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut query = sqlx::query_as::<Sqlite, T>(sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    query.fetch_all(conn).await.map_err(backend)
}

/// Entities of one kind in insertion order, or the one matching `id`
async fn fetch(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    id: Option<&str>,
) -> Result<Vec<Entity>> {
    let filter = if id.is_some() { " WHERE id = ?1" } else { "" };
    let sql = format!(
        "SELECT * FROM {}{} ORDER BY rowid",
        kind.collection(),
        filter
    );

    let entities = match kind {
        EntityKind::State => rows::<NamedRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::State(r.into()))
            .collect(),
        EntityKind::Amenity => rows::<NamedRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::Amenity(r.into()))
            .collect(),
        EntityKind::City => rows::<CityRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::City(r.into()))
            .collect(),
        EntityKind::User => rows::<UserRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::User(r.into()))
            .collect(),
        EntityKind::Review => rows::<ReviewRow>(conn, &sql, id)
            .await?
            .into_iter()
            .map(|r| Entity::Review(r.into()))
            .collect(),
        EntityKind::Place => {
            let places = rows::<PlaceRow>(&mut *conn, &sql, id).await?;
            let mut links = amenity_links(conn, id).await?;
            places
                .into_iter()
                .map(|r| {
                    let amenity_ids = links.remove(&r.id).unwrap_or_default();
                    let mut place: Place = r.into();
                    place.amenity_ids = amenity_ids;
                    Entity::Place(place)
                })
                .collect()
        }
    };
    Ok(entities)
}

/// Linked amenity ids per place, in link order
async fn amenity_links(
    conn: &mut SqliteConnection,
    place_id: Option<&str>,
) -> Result<HashMap<String, Vec<String>>> {
    let filter = if place_id.is_some() {
        " WHERE place_id = ?1"
    } else {
        ""
    };
    let sql = format!(
        "SELECT place_id, amenity_id FROM place_amenity{} ORDER BY rowid",
        filter
    );

    let mut links: HashMap<String, Vec<String>> = HashMap::new();
    for (place, amenity) in rows::<(String, String)>(conn, &sql, place_id).await? {
        links.entry(place).or_default().push(amenity);
    }
    Ok(links)
}

/// Insert or update in place; the row keeps its rowid and so its position
async fn upsert(conn: &mut SqliteConnection, entity: &Entity) -> Result<()> {
    match entity {
        Entity::State(State { base, name }) | Entity::Amenity(Amenity { base, name }) => {
            let sql = format!(
                "INSERT INTO {} (id, created_at, updated_at, name) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at, name = excluded.name",
                entity.kind().collection()
            );
            sqlx::query(&sql)
                .bind(&base.id)
                .bind(base.created_at)
                .bind(base.updated_at)
                .bind(name)
                .execute(conn)
                .await
                .map_err(backend)?;
        }
        Entity::City(city) => {
            sqlx::query(
                r#"
                INSERT INTO cities (id, created_at, updated_at, state_id, name)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    state_id = excluded.state_id,
                    name = excluded.name
                "#,
            )
            .bind(&city.base.id)
            .bind(city.base.created_at)
            .bind(city.base.updated_at)
            .bind(&city.state_id)
            .bind(&city.name)
            .execute(conn)
            .await
            .map_err(backend)?;
        }
        Entity::User(user) => {
            sqlx::query(
                r#"
                INSERT INTO users (id, created_at, updated_at, email, password, first_name, last_name)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    email = excluded.email,
                    password = excluded.password,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name
                "#,
            )
            .bind(&user.base.id)
            .bind(user.base.created_at)
            .bind(user.base.updated_at)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .execute(conn)
            .await
            .map_err(backend)?;
        }
        Entity::Place(place) => {
            sqlx::query(
                r#"
                INSERT INTO places (
                    id, created_at, updated_at, city_id, user_id, name, description,
                    number_rooms, number_bathrooms, max_guest, price_by_night, latitude, longitude
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    city_id = excluded.city_id,
                    user_id = excluded.user_id,
                    name = excluded.name,
                    description = excluded.description,
                    number_rooms = excluded.number_rooms,
                    number_bathrooms = excluded.number_bathrooms,
                    max_guest = excluded.max_guest,
                    price_by_night = excluded.price_by_night,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude
                "#,
            )
            .bind(&place.base.id)
            .bind(place.base.created_at)
            .bind(place.base.updated_at)
            .bind(&place.city_id)
            .bind(&place.user_id)
            .bind(&place.name)
            .bind(&place.description)
            .bind(place.number_rooms)
            .bind(place.number_bathrooms)
            .bind(place.max_guest)
            .bind(place.price_by_night)
            .bind(place.latitude)
            .bind(place.longitude)
            .execute(&mut *conn)
            .await
            .map_err(backend)?;

            sqlx::query("DELETE FROM place_amenity WHERE place_id = ?1")
                .bind(&place.base.id)
                .execute(&mut *conn)
                .await
                .map_err(backend)?;
            for amenity_id in &place.amenity_ids {
                sqlx::query("INSERT INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)")
                    .bind(&place.base.id)
                    .bind(amenity_id)
                    .execute(&mut *conn)
                    .await
                    .map_err(backend)?;
            }
        }
        Entity::Review(review) => {
            sqlx::query(
                r#"
                INSERT INTO reviews (id, created_at, updated_at, place_id, user_id, text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    updated_at = excluded.updated_at,
                    place_id = excluded.place_id,
                    user_id = excluded.user_id,
                    text = excluded.text
                "#,
            )
            .bind(&review.base.id)
            .bind(review.base.created_at)
            .bind(review.base.updated_at)
            .bind(&review.place_id)
            .bind(&review.user_id)
            .bind(&review.text)
            .execute(conn)
            .await
            .map_err(backend)?;
        }
    }
    Ok(())
}

// Row types

fn base(id: String, created_at: NaiveDateTime, updated_at: NaiveDateTime) -> BaseModel {
    BaseModel {
        id,
        created_at,
        updated_at,
    }
}

/// Row shape shared by `states` and `amenities`
#[derive(sqlx::FromRow)]
struct NamedRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    name: String,
}

impl From<NamedRow> for State {
    fn from(r: NamedRow) -> Self {
        State {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

impl From<NamedRow> for Amenity {
    fn from(r: NamedRow) -> Self {
        Amenity {
            base: base(r.id, r.created_at, r.updated_at),
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CityRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    state_id: String,
    name: String,
}

impl From<CityRow> for City {
    fn from(r: CityRow) -> Self {
        City {
            base: base(r.id, r.created_at, r.updated_at),
            state_id: r.state_id,
            name: r.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            base: base(r.id, r.created_at, r.updated_at),
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    city_id: String,
    user_id: String,
    name: String,
    description: Option<String>,
    number_rooms: i64,
    number_bathrooms: i64,
    max_guest: i64,
    price_by_night: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<PlaceRow> for Place {
    fn from(r: PlaceRow) -> Self {
        Place {
            base: base(r.id, r.created_at, r.updated_at),
            city_id: r.city_id,
            user_id: r.user_id,
            name: r.name,
            description: r.description,
            number_rooms: r.number_rooms,
            number_bathrooms: r.number_bathrooms,
            max_guest: r.max_guest,
            price_by_night: r.price_by_night,
            latitude: r.latitude,
            longitude: r.longitude,
            amenity_ids: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    place_id: String,
    user_id: String,
    text: String,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Review {
            base: base(r.id, r.created_at, r.updated_at),
            place_id: r.place_id,
            user_id: r.user_id,
            text: r.text,
        }
    }
}
