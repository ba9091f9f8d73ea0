use super::entities::{toast, ToastEntity};
use crate::domain::{NewToast, Toast, VoteChange, VoteDelta};
use crate::port::ToastRepository;
use async_trait::async_trait;
use cheers_errors::AppError;
use rand::seq::SliceRandom;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, UpdateMany};
use uuid::Uuid;

#[derive(Clone)]
pub struct SeaOrmToastRepository {
    db: DatabaseConnection,
}

impl SeaOrmToastRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> AppError {
    tracing::error!("Database error: {}", e);
    AppError::Repository(e.to_string())
}

fn counter(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl From<toast::Model> for Toast {
    fn from(m: toast::Model) -> Self {
        Self {
            id: m.id,
            text: m.text,
            created_by: m.created_by,
            likes: counter(m.likes),
            dislikes: counter(m.dislikes),
            total_votes: counter(m.total_votes),
            last_vote_at: m.last_vote_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// `column = GREATEST(column + delta, 0)` in one statement, so concurrent
/// votes from other devices are never overwritten.
fn shifted(column: &str, delta: i32) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust_with_values(format!("GREATEST({} + $1, 0)", column), [delta])
}

fn vote_update(
    toast_id: Uuid,
    delta: VoteDelta,
    now: chrono::DateTime<chrono::Utc>,
) -> UpdateMany<ToastEntity> {
    let update = ToastEntity::update_many()
        .col_expr(toast::Column::Likes, shifted("likes", delta.likes))
        .col_expr(toast::Column::Dislikes, shifted("dislikes", delta.dislikes))
        .col_expr(toast::Column::TotalVotes, shifted("total_votes", delta.total_votes))
        .col_expr(toast::Column::UpdatedAt, Expr::value(now));

    let update = if delta.casts_vote {
        update.col_expr(toast::Column::LastVoteAt, Expr::value(Some(now)))
    } else {
        update
    };
    update.filter(toast::Column::Id.eq(toast_id))
}

#[async_trait]
impl ToastRepository for SeaOrmToastRepository {
    async fn list_toasts(&self) -> Result<Vec<Toast>, AppError> {
        let models = ToastEntity::find()
            .order_by_desc(toast::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(Toast::from).collect())
    }

    async fn get_toast_by_id(&self, id: Uuid) -> Result<Option<Toast>, AppError> {
        let model = ToastEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(Toast::from))
    }

    async fn get_random_toast_from_ids(&self, ids: &[Uuid]) -> Result<Option<Toast>, AppError> {
        let picked = {
            let mut rng = rand::thread_rng();
            ids.choose(&mut rng).copied()
        };

        match picked {
            Some(id) => self.get_toast_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn create_toast(&self, new_toast: NewToast) -> Result<Toast, AppError> {
        let toast_data = Toast::new(new_toast);
        let active = toast::ActiveModel {
            id: Set(toast_data.id),
            text: Set(toast_data.text.clone()),
            created_by: Set(toast_data.created_by.clone()),
            likes: Set(0),
            dislikes: Set(0),
            total_votes: Set(0),
            last_vote_at: Set(None),
            created_at: Set(toast_data.created_at),
            updated_at: Set(toast_data.updated_at),
        };
        let model = active.insert(&self.db).await.map_err(db_err)?;
        Ok(Toast::from(model))
    }

    async fn update_vote(&self, change: VoteChange) -> Result<(), AppError> {
        let delta = change.delta();
        if delta.is_noop() {
            return Ok(());
        }

        let result = vote_update(change.toast_id, delta, chrono::Utc::now())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
