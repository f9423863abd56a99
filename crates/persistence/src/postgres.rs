use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, OrderItemId, ProductId, UserId};
use domain::repository::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use domain::{Money, Order, OrderFilter, OrderItem, OrderStatus, Product, User};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{PersistenceError, Result};

type RepoResult<T> = domain::repository::Result<T>;

const ORDER_COLUMNS: &str = "o.id, o.status, o.created_at, o.updated_at, o.closed_at, o.version";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, price_cents, quantity, created_at, deleted_at";

const PRODUCT_COLUMNS: &str = "id, name, price_cents, created_at, updated_at, deleted_at";

const USER_COLUMNS: &str = "id, cpf, password_hash, refresh_token, refresh_token_expires_at, created_at, updated_at";

/// PostgreSQL-backed store implementing every repository port.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| PersistenceError::InvalidValue {
            column: "order_items.quantity",
            value: quantity.to_string(),
        })?;

        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity,
            created_at: row.try_get("created_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;

        Ok(Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            status.parse::<OrderStatus>()?,
            items,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
            row.try_get("closed_at")?,
            row.try_get("version")?,
        ))
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cpf: row.try_get("cpf")?,
            password_hash: row.try_get("password_hash")?,
            refresh_token: row.try_get("refresh_token")?,
            refresh_token_expires_at: row.try_get("refresh_token_expires_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Attaches every line to its order row, keeping the row order.
    async fn load_orders(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let item_rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY created_at ASC, id ASC"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &item_rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items.entry(order_id).or_default().push(Self::row_to_item(row)?);
        }

        rows.iter()
            .zip(ids)
            .map(|(row, id)| Self::row_to_order(row, items.remove(&id).unwrap_or_default()))
            .collect()
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.load_orders(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        const LIVE_TOTAL: &str = "COALESCE((SELECT SUM(i.price_cents::numeric * i.quantity) FROM order_items i \
             WHERE i.order_id = o.id AND i.deleted_at IS NULL), 0)";

        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE 1=1");
        let mut param_count = 0;

        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND o.status = ${param_count}"));
        }
        let range = filter.created_range();
        if range.is_some() {
            sql.push_str(&format!(
                " AND o.created_at >= ${} AND o.created_at < ${}",
                param_count + 1,
                param_count + 2
            ));
            param_count += 2;
        }
        if filter.min_total.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND {LIVE_TOTAL} >= ${param_count}"));
        }
        if filter.max_total.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND {LIVE_TOTAL} <= ${param_count}"));
        }

        sql.push_str(" ORDER BY o.created_at ASC, o.id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some((start, end)) = range {
            query = query.bind(start).bind(end);
        }
        if let Some(min) = filter.min_total {
            query = query.bind(min.cents());
        }
        if let Some(max) = filter.max_total {
            query = query.bind(max.cents());
        }

        let rows = query.fetch_all(&self.pool).await?;
        self.load_orders(rows).await
    }

    /// Writes every line of the order in one statement. Existing rows are only
    /// touched when their quantity or deletion mark changed.
    async fn upsert_items(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        let items = order.all_items();
        if items.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = items.iter().map(|i| i.id.as_uuid()).collect();
        let order_ids: Vec<Uuid> = vec![order.id().as_uuid(); items.len()];
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id.as_uuid()).collect();
        let names: Vec<String> = items.iter().map(|i| i.product_name.clone()).collect();
        let prices: Vec<i64> = items.iter().map(|i| i.price.cents()).collect();
        let quantities: Vec<i64> = items.iter().map(|i| i64::from(i.quantity)).collect();
        let created: Vec<_> = items.iter().map(|i| i.created_at).collect();
        let deleted: Vec<_> = items.iter().map(|i| i.deleted_at).collect();

        sqlx::query(&format!(
            r#"
            INSERT INTO order_items ({ITEM_COLUMNS})
            SELECT * FROM UNNEST(
                $1::uuid[], $2::uuid[], $3::uuid[], $4::text[],
                $5::bigint[], $6::bigint[], $7::timestamptz[], $8::timestamptz[]
            )
            ON CONFLICT (id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                deleted_at = EXCLUDED.deleted_at
            WHERE order_items.quantity IS DISTINCT FROM EXCLUDED.quantity
               OR order_items.deleted_at IS DISTINCT FROM EXCLUDED.deleted_at
            "#
        ))
        .bind(ids)
        .bind(order_ids)
        .bind(product_ids)
        .bind(names)
        .bind(prices)
        .bind(quantities)
        .bind(created)
        .bind(deleted)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_order(&self, order: Order) -> Result<Order> {
        let updated_at = order.updated_at();
        let order = order.stamped(1, updated_at);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, status, created_at, updated_at, closed_at, version)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(order.closed_at())
        .bind(order.version())
        .execute(&mut *tx)
        .await?;

        Self::upsert_items(&mut tx, &order).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn fetch_user(&self, column: &str, bind: UserKey<'_>) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let query = sqlx::query(&query);
        let query = match bind {
            UserKey::Id(id) => query.bind(id.as_uuid()),
            UserKey::Cpf(cpf) => query.bind(cpf),
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::row_to_user).transpose()
    }
}

enum UserKey<'a> {
    Id(UserId),
    Cpf(&'a str),
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn get_order(&self, id: OrderId) -> RepoResult<Option<Order>> {
        Ok(self.fetch_order(id).await?)
    }

    async fn list_orders(&self) -> RepoResult<Vec<Order>> {
        Ok(self.fetch_orders(&OrderFilter::new()).await?)
    }

    async fn orders_by_status(&self, status: OrderStatus) -> RepoResult<Vec<Order>> {
        Ok(self.fetch_orders(&OrderFilter::new().status(status)).await?)
    }

    async fn query_orders(&self, filter: &OrderFilter) -> RepoResult<Vec<Order>> {
        Ok(self.fetch_orders(filter).await?)
    }

    async fn add_order(&self, order: Order) -> RepoResult<Order> {
        Ok(self.insert_order(order).await?)
    }

    async fn update_order(&self, order: Order) -> RepoResult<Order> {
        let mut tx = self.pool.begin().await.map_err(PersistenceError::from)?;

        // Row lock serializes concurrent writers on the same order
        let current: Option<i64> =
            sqlx::query_scalar("SELECT version FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order.id().as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(PersistenceError::from)?;

        let Some(actual) = current else {
            return Err(RepositoryError::NotFound {
                entity: "Order",
                id: order.id().to_string(),
            });
        };

        if actual != order.version() {
            tracing::warn!(order_id = %order.id(), expected = order.version(), actual, "stale order write");
            return Err(RepositoryError::Conflict {
                entity: "Order",
                id: order.id().to_string(),
                expected: order.version(),
                actual,
            });
        }

        let next_version = order.version() + 1;
        let order = order.stamped(next_version, Utc::now());

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, updated_at = $3, closed_at = $4, version = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.updated_at())
        .bind(order.closed_at())
        .bind(order.version())
        .execute(&mut *tx)
        .await
        .map_err(PersistenceError::from)?;

        Self::upsert_items(&mut tx, &order).await?;
        tx.commit().await.map_err(PersistenceError::from)?;
        Ok(order)
    }
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        Ok(self.fetch_product(id).await?)
    }

    async fn list_products(&self) -> RepoResult<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(PersistenceError::from)?;

        Ok(rows
            .iter()
            .map(Self::row_to_product)
            .collect::<Result<Vec<_>>>()?)
    }

    async fn add_product(&self, product: Product) -> RepoResult<Product> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::from)?;

        Ok(product)
    }

    async fn update_product(&self, product: Product) -> RepoResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET name = $2, price_cents = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(product.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(PersistenceError::from)?;

        match row {
            Some(row) => Ok(Self::row_to_product(&row)?),
            None => Err(RepositoryError::NotFound {
                entity: "Product",
                id: product.id.to_string(),
            }),
        }
    }

    async fn delete_product(&self, id: ProductId) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::from)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self.fetch_user("id", UserKey::Id(id)).await?)
    }

    async fn find_user_by_cpf(&self, cpf: &str) -> RepoResult<Option<User>> {
        Ok(self.fetch_user("cpf", UserKey::Cpf(cpf)).await?)
    }

    async fn add_user(&self, user: User) -> RepoResult<User> {
        sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(user.id.as_uuid())
        .bind(&user.cpf)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.refresh_token_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("unique_user_cpf")
            {
                return RepositoryError::Duplicate {
                    entity: "User",
                    key: user.cpf.clone(),
                };
            }
            PersistenceError::Database(e).into()
        })?;

        Ok(user)
    }

    async fn update_user(&self, mut user: User) -> RepoResult<User> {
        user.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, refresh_token = $3, refresh_token_expires_at = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.refresh_token_expires_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "User",
                id: user.id.to_string(),
            });
        }
        Ok(user)
    }
}
