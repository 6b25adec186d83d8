//! Quota check and usage handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use studygate_models::{ActionKind, Decision, UsageStats};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Request body for a quota check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckQuotaRequest {
    /// Action about to be taken. Unknown names are allowed through.
    pub action: ActionKind,
}

/// Decide whether the caller may take an action.
///
/// A denial is a normal `200` response with `allowed: false`.
pub async fn check_quota(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckQuotaRequest>,
) -> ApiResult<Json<Decision>> {
    let decision = state.quota.evaluate(&user.uid, request.action).await?;

    if !decision.allowed {
        info!(
            uid = %user.uid,
            action = %request.action,
            current = ?decision.current,
            limit = ?decision.limit,
            "Free plan limit reached"
        );
    }

    Ok(Json(decision))
}

/// Current usage against every free-plan quota.
pub async fn get_usage(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<UsageStats>> {
    let stats = state.quota.usage_stats(&user.uid).await?;
    Ok(Json(stats))
}
