use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use cheers_app::domain::{NewToast, Toast, VoteChange};
use cheers_app::infrastructure::http::{CreateToastRequest, RandomToastRequest, VoteRequest};
use cheers_app::AppContext;
use cheers_errors::AppError;
use uuid::Uuid;

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/toasts", get(list_toasts).post(create_toast))
        .route("/api/toasts/random", post(random_toast))
        .route("/api/toasts/{id}", get(get_toast))
        .route("/api/toasts/{id}/vote", post(update_vote))
        .with_state(ctx)
}

async fn list_toasts(State(ctx): State<AppContext>) -> Result<Json<Vec<Toast>>, AppError> {
    ctx.toast_repo.list_toasts().await.map(Json)
}

async fn get_toast(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Toast>, AppError> {
    ctx.toast_repo
        .get_toast_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

async fn random_toast(
    State(ctx): State<AppContext>,
    Json(request): Json<RandomToastRequest>,
) -> Result<Json<Option<Toast>>, AppError> {
    ctx.toast_repo
        .get_random_toast_from_ids(&request.ids)
        .await
        .map(Json)
}

async fn create_toast(
    State(ctx): State<AppContext>,
    Json(request): Json<CreateToastRequest>,
) -> Result<(StatusCode, Json<Toast>), AppError> {
    let new_toast = NewToast::parse(&request.text, request.created_by.as_deref())?;
    let toast = ctx.toast_repo.create_toast(new_toast).await?;
    tracing::info!("Toast {} added by {}", toast.id, toast.created_by);
    Ok((StatusCode::CREATED, Json(toast)))
}

async fn update_vote(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<StatusCode, AppError> {
    let change = VoteChange::new(id, request.vote, request.previous_vote);
    ctx.toast_repo.update_vote(change).await?;
    Ok(StatusCode::NO_CONTENT)
}
