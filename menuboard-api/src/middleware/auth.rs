/// Authentication layers
///
/// `admin_auth` accepts any valid access token and stores the
/// [`AuthContext`] for handlers. `super_admin_auth` additionally requires
/// the `super_admin` role.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use menuboard_shared::auth::{authorization, middleware::authenticate};

pub async fn admin_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

pub async fn super_admin_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    authorization::require_super_admin(&auth)?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
