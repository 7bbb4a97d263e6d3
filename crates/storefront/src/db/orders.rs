//! Order repository.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use petshop_core::cart::{Cart, CartLine};
use petshop_core::checkout::{OrderTotals, PaymentMethod, ValidAddress};
use petshop_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderItem, Page, Pagination};

const ORDER_COLUMNS: &str = "id, user_id, subtotal, shipping_fee, total, delivery_address, cep, \
     payment_method, status, payment_session_id, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ReservedProduct {
    name: String,
    price: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order, in one transaction.
    ///
    /// Stock is decremented for every line, prices are re-read from the
    /// product rows being locked, the order and its items are written and
    /// the cart is emptied. Nothing is written if any step fails.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product no longer has enough
    /// stock (or was deactivated), `RepositoryError::Database` otherwise.
    pub async fn place(
        &self,
        user_id: UserId,
        cart: &Cart,
        address: &ValidAddress,
        payment_method: PaymentMethod,
        shipping_fee: Decimal,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock product rows in id order so concurrent checkouts cannot deadlock.
        let mut lines: Vec<&CartLine> = cart.lines.iter().collect();
        lines.sort_by_key(|line| line.product_id);

        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| RepositoryError::Conflict(format!("invalid quantity for {}", line.name)))?;
            let reserved = sqlx::query_as::<_, ReservedProduct>(
                r"
                UPDATE petshop.product
                SET stock = stock - $2, updated_at = NOW()
                WHERE id = $1 AND active AND stock >= $2
                RETURNING name, price
                ",
            )
            .bind(line.product_id)
            .bind(quantity)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::Conflict(format!("{} does not have enough stock", line.name))
            })?;

            priced.push(CartLine {
                name: reserved.name,
                unit_price: reserved.price,
                ..line.clone()
            });
        }

        let priced = Cart::new(priced);
        let totals = OrderTotals::compute(&priced, shipping_fee);

        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO petshop.customer_order
                (user_id, subtotal, shipping_fee, total, delivery_address, cep, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(totals.subtotal)
        .bind(totals.shipping_fee)
        .bind(totals.total)
        .bind(address.single_line())
        .bind(&address.cep)
        .bind(payment_method)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let quantity = i32::try_from(line.quantity).unwrap_or(i32::MAX);
            let item = sqlx::query_as::<_, OrderItem>(
                r"
                INSERT INTO petshop.order_item
                    (order_id, product_id, product_name, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, order_id, product_id, product_name, quantity, unit_price, subtotal
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(quantity)
            .bind(line.unit_price)
            .bind(line.line_total())
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        sqlx::query("DELETE FROM petshop.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(OrderDetail { order, items })
    }

    /// Remember the hosted-checkout session of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_payment_session(&self, id: OrderId, session_id: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE petshop.customer_order
            SET payment_session_id = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(session_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM petshop.customer_order \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// An order header by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM petshop.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// An order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.items(id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// Items of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, product_name, quantity, unit_price, subtotal
            FROM petshop.order_item WHERE order_id = $1 ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// Move an order from `from` to `to`, only if it is still in `from`.
    ///
    /// Returns `None` when the order was not in `from` anymore.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE petshop.customer_order SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Set an order's status unconditionally (back office).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE petshop.customer_order SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// One page of orders, optionally of a single status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        pagination: Pagination,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM petshop.customer_order WHERE TRUE");
        if let Some(status) = status {
            count.push(" AND status = ").push_bind(status);
        }
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM petshop.customer_order WHERE TRUE"
        ));
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status);
        }
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let orders = query.build_query_as::<Order>().fetch_all(self.pool).await?;

        Ok(Page::new(orders, total, pagination.page, pagination.per_page))
    }

    /// Number of orders in each status that has any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let counts = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM petshop.customer_order GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(counts)
    }

    /// Whether the user has bought this product (used to flag verified reviews).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_purchased(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let purchased = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS (
                SELECT 1 FROM petshop.order_item i
                JOIN petshop.customer_order o ON o.id = i.order_id
                WHERE o.user_id = $1 AND i.product_id = $2 AND o.status <> 'canceled'
            )
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(purchased)
    }
}
