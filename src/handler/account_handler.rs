use crate::dto::token_dto::{RefreshRequestDto, TokenPairDto};
use crate::dto::user_dto::{ChangeStatusDto, LoginDto, SignUpDto, UserReadDto};
use crate::error::request_error::ValidatedRequest;
use crate::error::AppError;
use crate::response::app_response::SuccessResponse;
use crate::service::device_service::DeviceService;
use crate::state::account_state::AccountState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

pub async fn register(
    State(state): State<AccountState>,
    ValidatedRequest(payload): ValidatedRequest<SignUpDto>,
) -> Result<SuccessResponse<UserReadDto>, AppError> {
    let user = state.account_service.register(payload).await?;
    Ok(SuccessResponse::send(UserReadDto::from(user)).with_status(StatusCode::CREATED))
}

pub async fn login(
    State(state): State<AccountState>,
    headers: HeaderMap,
    ValidatedRequest(payload): ValidatedRequest<LoginDto>,
) -> Result<SuccessResponse<TokenPairDto>, AppError> {
    let device = DeviceService::extract(&headers);
    let token = state.account_service.login(payload, device).await?;
    Ok(SuccessResponse::send(TokenPairDto::from(token)))
}

pub async fn refresh(
    State(state): State<AccountState>,
    ValidatedRequest(payload): ValidatedRequest<RefreshRequestDto>,
) -> Result<SuccessResponse<TokenPairDto>, AppError> {
    let token = state.account_service.refresh(&payload.refresh_token).await?;
    Ok(SuccessResponse::send(TokenPairDto::from(token)))
}

pub async fn set_status(
    State(state): State<AccountState>,
    Path(identity): Path<Uuid>,
    Json(payload): Json<ChangeStatusDto>,
) -> Result<SuccessResponse<UserReadDto>, AppError> {
    let user = state
        .account_service
        .set_active_status(identity, payload.active)
        .await?;
    Ok(SuccessResponse::send(UserReadDto::from(user)))
}
