//! SeaORM implementation of CoinLedgerRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::{CoinEntry, CoinLedgerRepository, DomainError, TransactionPage};
use crate::models::TransactionType;
use crate::models::coin_transaction::{self, Entity as CoinTransactionEntity};
use crate::models::user::{self, Entity as UserEntity};

/// Move the user's cached balance and insert the matching ledger row.
///
/// Must run inside the caller's transaction. Debits only apply while
/// `coins >= -amount`, so the balance never goes negative.
pub(crate) async fn append_entry(
    txn: &DatabaseTransaction,
    entry: &CoinEntry,
    at: DateTime<Utc>,
) -> Result<coin_transaction::Model, DomainError> {
    let mut update = UserEntity::update_many()
        .col_expr(
            user::Column::Coins,
            Expr::col(user::Column::Coins).add(entry.amount),
        )
        .col_expr(user::Column::UpdatedAt, Expr::value(at))
        .filter(user::Column::Id.eq(entry.user_id))
        .filter(user::Column::DeletedAt.is_null());
    if entry.amount < 0 {
        update = update.filter(user::Column::Coins.gte(-entry.amount));
    }

    let result = update.exec(txn).await?;
    if result.rows_affected == 0 {
        let exists = UserEntity::find_by_id(entry.user_id)
            .filter(user::Column::DeletedAt.is_null())
            .one(txn)
            .await?
            .is_some();
        return Err(if exists {
            DomainError::InsufficientBalance
        } else {
            DomainError::NotFound("user")
        });
    }

    let row = coin_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(entry.user_id),
        amount: Set(entry.amount),
        transaction_type: Set(entry.transaction_type),
        reason: Set(entry.reason.clone()),
        reference_type: Set(entry.reference.as_ref().map(|r| r.kind.clone())),
        reference_id: Set(entry.reference.as_ref().map(|r| r.id)),
        created_at: Set(at),
        updated_at: Set(at),
        ..Default::default()
    };

    Ok(row.insert(txn).await?)
}

/// SeaORM-based implementation of CoinLedgerRepository
pub struct SeaOrmCoinLedgerRepository {
    db: DatabaseConnection,
}

impl SeaOrmCoinLedgerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn sum_where(
        &self,
        user_id: Uuid,
        earned_only: bool,
    ) -> Result<i64, DomainError> {
        let mut query = CoinTransactionEntity::find()
            .select_only()
            .column_as(coin_transaction::Column::Amount.sum(), "total")
            .filter(coin_transaction::Column::UserId.eq(user_id))
            .filter(coin_transaction::Column::DeletedAt.is_null());
        if earned_only {
            query = query
                .filter(coin_transaction::Column::TransactionType.is_in([
                    TransactionType::Earned,
                    TransactionType::AdminAdjustment,
                ]))
                .filter(coin_transaction::Column::Amount.gt(0));
        }

        let total = query.into_tuple::<Option<i64>>().one(&self.db).await?;
        Ok(total.flatten().unwrap_or(0))
    }
}

#[async_trait]
impl CoinLedgerRepository for SeaOrmCoinLedgerRepository {
    async fn append(&self, entry: CoinEntry) -> Result<coin_transaction::Model, DomainError> {
        let txn = self.db.begin().await?;
        let row = append_entry(&txn, &entry, Utc::now()).await?;
        txn.commit().await?;
        Ok(row)
    }

    async fn balance(&self, user_id: Uuid) -> Result<i64, DomainError> {
        let user = UserEntity::find_by_id(user_id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        Ok(user.coins)
    }

    async fn ledger_sum(&self, user_id: Uuid) -> Result<i64, DomainError> {
        self.sum_where(user_id, false).await
    }

    async fn total_earned(&self, user_id: Uuid) -> Result<i64, DomainError> {
        self.sum_where(user_id, true).await
    }

    async fn recent(
        &self,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<coin_transaction::Model>, DomainError> {
        let rows = CoinTransactionEntity::find()
            .filter(coin_transaction::Column::UserId.eq(user_id))
            .filter(coin_transaction::Column::DeletedAt.is_null())
            .order_by_desc(coin_transaction::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn page(
        &self,
        user_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<TransactionPage, DomainError> {
        let per_page = per_page.max(1);
        let paginator = CoinTransactionEntity::find()
            .filter(coin_transaction::Column::UserId.eq(user_id))
            .filter(coin_transaction::Column::DeletedAt.is_null())
            .order_by_desc(coin_transaction::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page).await?;

        Ok(TransactionPage {
            items,
            total,
            page,
            per_page,
        })
    }
}
