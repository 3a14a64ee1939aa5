//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use common::models::{AdminRequest, PortfolioKind};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    assistant,
    bills::BillDraft,
    error::{ApiError, ApiResult},
    gst::{self, TaxRequest},
    middleware::{AuthUser, auth_middleware, require_admin},
    models::{
        AdminRequestResponse, AppDataResponse, AssistantRequest, CreateRequestBody,
        EscalateRequest, GstFormsQuery, MarketRatesRequest, MarketRatesResponse,
        PortfolioCreateRequest, PortfolioDeleteRequest, PortfolioQuery, PortfolioResponse,
        ResolveRequestBody, UpdatedRatesResponse,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let admin_only = middleware::from_fn(require_admin);

    let protected_routes = Router::new()
        .route("/api/app-data", get(app_data).fallback(method_not_allowed))
        .route(
            "/api/portfolio",
            get(get_portfolio)
                .post(create_portfolio_entry)
                .delete(delete_portfolio_entry)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/requests",
            post(create_request)
                .merge(put(resolve_request).route_layer(admin_only.clone()))
                .fallback(method_not_allowed),
        )
        .route(
            "/api/assistant/escalate",
            post(escalate).fallback(method_not_allowed),
        )
        .route_layer(authenticated.clone());

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/market-rates",
            get(get_market_rates)
                .merge(
                    post(update_market_rates)
                        .route_layer(admin_only)
                        .route_layer(authenticated),
                )
                .fallback(method_not_allowed),
        )
        .route("/api/gst/forms", get(gst_forms).fallback(method_not_allowed))
        .route(
            "/api/gst/calculate",
            post(gst_calculate).fallback(method_not_allowed),
        )
        .route(
            "/api/bills/classify",
            post(classify_bill).fallback(method_not_allowed),
        )
        .route(
            "/api/assistant",
            post(ask_assistant).fallback(method_not_allowed),
        )
        .merge(protected_routes)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy answering preflight requests for the browser client
pub fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(HeaderValue::from_str(origin)?),
        None => AllowOrigin::any(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Current market rates; public so the dashboard ticker works before login
pub async fn get_market_rates(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let market_rates = state.market_rates.get().await?;

    Ok(Json(MarketRatesResponse {
        success: true,
        market_rates,
    }))
}

/// Replace the market rates (admin only)
pub async fn update_market_rates(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<MarketRatesRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let update = payload.into_update().map_err(ApiError::BadRequest)?;
    let updated_rates = state.market_rates.set(&update).await?;

    info!(
        "Market rates set to version {} by {}",
        updated_rates.version, user.email
    );

    Ok(Json(UpdatedRatesResponse {
        success: true,
        updated_rates,
    }))
}

/// Dashboard bootstrap data
pub async fn app_data(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let market_rates = state.market_rates.get().await?;
    let admin_requests = if user.is_admin() {
        state.admin_requests.list_all().await?
    } else {
        state.admin_requests.list_for_user(&user.id).await?
    };

    Ok(Json(AppDataResponse {
        success: true,
        market_rates,
        admin_requests,
    }))
}

/// Portfolio of the session user, or of `?userId=` for admins
pub async fn get_portfolio(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Query(query), _): WithRejection<Query<PortfolioQuery>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let owner = match query.user_id {
        Some(requested) if requested != user.id => {
            if !user.is_admin() {
                return Err(ApiError::Forbidden);
            }
            requested
        }
        _ => user.id,
    };

    let portfolio = state.portfolio.get(&owner).await?;
    let summary = portfolio.summary();

    Ok(Json(PortfolioResponse {
        success: true,
        fdrd: portfolio.fdrd,
        stocks: portfolio.stocks,
        huf_pf: portfolio.huf_pf,
        summary,
    }))
}

/// Add rows to the session user's portfolio
pub async fn create_portfolio_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<PortfolioCreateRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    match payload {
        PortfolioCreateRequest::Fdrd(entries) => {
            let entries = entries.into_vec();
            if entries.is_empty() {
                return Err(ApiError::BadRequest("No entries to insert".to_string()));
            }
            for entry in &entries {
                entry.validate().map_err(ApiError::BadRequest)?;
            }

            let rows: Vec<_> = entries
                .into_iter()
                .map(|entry| entry.into_entry(&user.id))
                .collect();
            state.portfolio.insert_fdrd(&rows).await?;

            let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
            Ok((
                StatusCode::CREATED,
                Json(json!({ "success": true, "insertedIds": ids })),
            ))
        }
        PortfolioCreateRequest::Stocks(holdings) => {
            let holdings = holdings.into_vec();
            if holdings.is_empty() {
                return Err(ApiError::BadRequest("No holdings to insert".to_string()));
            }
            for holding in &holdings {
                holding.validate().map_err(ApiError::BadRequest)?;
            }

            let rows: Vec<_> = holdings
                .into_iter()
                .map(|holding| holding.into_holding(&user.id))
                .collect();
            state.portfolio.insert_stocks(&rows).await?;

            let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
            Ok((
                StatusCode::CREATED,
                Json(json!({ "success": true, "insertedIds": ids })),
            ))
        }
        PortfolioCreateRequest::HufPf(update) => {
            update.validate().map_err(ApiError::BadRequest)?;
            let huf_pf = state.portfolio.upsert_huf_pf(&user.id, &update).await?;

            Ok((
                StatusCode::OK,
                Json(json!({ "success": true, "hufPf": huf_pf })),
            ))
        }
    }
}

/// Delete one of the session user's rows
pub async fn delete_portfolio_entry(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<PortfolioDeleteRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state
        .portfolio
        .delete(&user.id, payload.kind, &payload.id)
        .await?;

    if !deleted {
        return Err(ApiError::NotFound("Entry not found".to_string()));
    }

    if payload.kind == PortfolioKind::HufPf {
        info!("User {} cleared their HUF/PF record", user.id);
    }

    Ok(Json(json!({ "success": true })))
}

async fn store_request(
    state: &AppState,
    request: AdminRequest,
) -> ApiResult<(StatusCode, Json<AdminRequestResponse>)> {
    state.admin_requests.create(&request).await?;
    info!("Admin request {} raised by {}", request.id, request.user_id);

    Ok((
        StatusCode::CREATED,
        Json(AdminRequestResponse {
            success: true,
            request,
        }),
    ))
}

/// Raise a support request as the session user
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateRequestBody>, ApiError>,
) -> ApiResult<(StatusCode, Json<AdminRequestResponse>)> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }

    store_request(
        &state,
        AdminRequest::new(&user.id, &user.name, &payload.message),
    )
    .await
}

/// Resolve a pending support request (admin only)
pub async fn resolve_request(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<ResolveRequestBody>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    if !state.admin_requests.resolve(&payload.id).await? {
        return Err(ApiError::NotFound("Pending request not found".to_string()));
    }

    info!("Admin request {} resolved", payload.id);
    Ok(Json(json!({ "success": true, "message": "Request resolved" })))
}

/// Hand the conversation over to an admin
pub async fn escalate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<EscalateRequest>, ApiError>,
) -> ApiResult<(StatusCode, Json<AdminRequestResponse>)> {
    let message = assistant::escalation_message(payload.query.as_deref());
    store_request(&state, AdminRequest::new(&user.id, &user.name, &message)).await
}

pub async fn ask_assistant(
    WithRejection(Json(payload), _): WithRejection<Json<AssistantRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    if payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is required".to_string()));
    }

    let answer = assistant::respond(&payload.message);
    Ok(Json(json!({
        "success": true,
        "financial": answer.financial,
        "topic": answer.topic,
        "reply": answer.reply,
    })))
}

/// Classify a bill draft; nothing is stored
pub async fn classify_bill(
    WithRejection(Json(draft), _): WithRejection<Json<BillDraft>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let bill = draft
        .classify()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(json!({ "success": true, "bill": bill })))
}

pub async fn gst_forms(
    WithRejection(Query(query), _): WithRejection<Query<GstFormsQuery>, ApiError>,
) -> impl IntoResponse {
    Json(json!({ "success": true, "forms": gst::forms(query.category) }))
}

pub async fn gst_calculate(
    WithRejection(Json(request), _): WithRejection<Json<TaxRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let taxes = gst::calculate(&request).map_err(ApiError::BadRequest)?;

    Ok(Json(json!({
        "success": true,
        "sgst": taxes.sgst,
        "cgst": taxes.cgst,
        "igst": taxes.igst,
        "cess": taxes.cess,
        "total": taxes.total,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ADMIN_ID, OTHER_ID, USER_ID, token_for, test_state};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::{DateTime, Utc};
    use common::{models::Role, token::TokenType};
    use serde_json::Value;
    use std::marker::PhantomData;
    use tower::ServiceExt;

    fn admin() -> String {
        token_for(ADMIN_ID, "Admin User", Role::Admin, TokenType::Access)
    }

    fn user() -> String {
        token_for(USER_ID, "Ganesh Kumar", Role::User, TokenType::Access)
    }

    fn other_user() -> String {
        token_for(OTHER_ID, "Priya Sharma", Role::User, TokenType::Access)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn rates(gold: f64, silver: f64, index: f64) -> Value {
        json!({ "goldRate": gold, "silverRate": silver, "marketIndex": index })
    }

    fn last_updated(body: &Value) -> DateTime<Utc> {
        serde_json::from_value(body["updatedRates"]["lastUpdated"].clone()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state());
        let (status, body) = send(&app, "GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "api-service");
    }

    #[tokio::test]
    async fn test_protected_routes_require_access_token() {
        let app = create_router(test_state());

        let (status, body) = send(&app, "GET", "/api/app-data", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, "GET", "/api/app-data", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let refresh = token_for(USER_ID, "Ganesh Kumar", Role::User, TokenType::Refresh);
        let (status, _) = send(&app, "GET", "/api/app-data", Some(&refresh), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/app-data", Some(&user()), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_market_rates_update_flow() {
        let app = create_router(test_state());

        let (status, body) = send(&app, "GET", "/api/market-rates", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["marketRates"].is_null());

        let (status, _) = send(
            &app,
            "POST",
            "/api/market-rates",
            None,
            Some(rates(6500.0, 85.0, 22500.0)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/api/market-rates",
            Some(&user()),
            Some(rates(6500.0, 85.0, 22500.0)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, first) = send(
            &app,
            "POST",
            "/api/market-rates",
            Some(&admin()),
            Some(rates(6500.0, 85.0, 22500.0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["updatedRates"]["goldRate"], 6500.0);

        let (status, second) = send(
            &app,
            "POST",
            "/api/market-rates",
            Some(&admin()),
            Some(rates(6550.0, 86.5, 22610.0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(last_updated(&second) > last_updated(&first));
        assert_eq!(second["updatedRates"]["version"], 2);

        let (_, body) = send(&app, "GET", "/api/market-rates", None, None).await;
        assert_eq!(body["marketRates"]["silverRate"], 86.5);
    }

    #[tokio::test]
    async fn test_market_rates_require_all_fields() {
        let app = create_router(test_state());

        for missing in ["goldRate", "silverRate", "marketIndex"] {
            let mut body = rates(6500.0, 85.0, 22500.0);
            body.as_object_mut().unwrap().remove(missing);

            let (status, response) =
                send(&app, "POST", "/api/market-rates", Some(&admin()), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "without {}", missing);
            assert_eq!(response["success"], false);
        }
    }

    #[tokio::test]
    async fn test_stale_market_rates_version_conflicts() {
        let app = create_router(test_state());

        send(
            &app,
            "POST",
            "/api/market-rates",
            Some(&admin()),
            Some(rates(6500.0, 85.0, 22500.0)),
        )
        .await;

        let mut stale = rates(6600.0, 85.0, 22500.0);
        stale["expectedVersion"] = json!(0);
        let (status, _) =
            send(&app, "POST", "/api/market-rates", Some(&admin()), Some(stale)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let mut current = rates(6600.0, 85.0, 22500.0);
        current["expectedVersion"] = json!(1);
        let (status, _) =
            send(&app, "POST", "/api/market-rates", Some(&admin()), Some(current)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_requests_resolve_once() {
        let app = create_router(test_state());

        let (status, created) = send(
            &app,
            "POST",
            "/api/requests",
            Some(&user()),
            Some(json!({ "message": "Need help with GSTR-1", "userId": ADMIN_ID })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["request"]["userId"], USER_ID);
        assert_eq!(created["request"]["userName"], "Ganesh Kumar");
        assert_eq!(created["request"]["status"], "pending");
        let id = created["request"]["_id"].clone();

        let (status, _) =
            send(&app, "PUT", "/api/requests", Some(&user()), Some(json!({ "id": id }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) =
            send(&app, "PUT", "/api/requests", Some(&admin()), Some(json!({ "id": id }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, "PUT", "/api/requests", Some(&admin()), Some(json!({ "id": id }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (status, _) = send(
            &app,
            "PUT",
            "/api/requests",
            Some(&admin()),
            Some(json!({ "id": "no-such-request" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_handlers_hand_back_the_stored_record() {
        let state = test_state();
        let ganesh = AuthUser {
            id: USER_ID.to_string(),
            email: "ganesh@taxora.com".to_string(),
            name: "Ganesh Kumar".to_string(),
            role: Role::User,
        };

        let (status, Json(created)) = create_request(
            State(state.clone()),
            Extension(ganesh.clone()),
            WithRejection(
                Json(CreateRequestBody {
                    message: "  Need help with ITR-2  ".to_string(),
                }),
                PhantomData,
            ),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.request.message, "Need help with ITR-2");

        let (status, Json(escalated)) = escalate(
            State(state.clone()),
            Extension(ganesh),
            WithRejection(Json(EscalateRequest::default()), PhantomData),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(escalated.request.message.ends_with("\"N/A\""));

        let stored = state.admin_requests.list_for_user(USER_ID).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_request_message_rejected() {
        let app = create_router(test_state());
        let (status, _) = send(
            &app,
            "POST",
            "/api/requests",
            Some(&user()),
            Some(json!({ "message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_app_data_scopes_requests_by_role() {
        let app = create_router(test_state());

        for token in [user(), other_user()] {
            send(
                &app,
                "POST",
                "/api/requests",
                Some(&token),
                Some(json!({ "message": "Please call me" })),
            )
            .await;
        }

        let (_, body) = send(&app, "GET", "/api/app-data", Some(&user()), None).await;
        let own = body["adminRequests"].as_array().unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0]["userId"], USER_ID);

        let (_, body) = send(&app, "GET", "/api/app-data", Some(&admin()), None).await;
        assert_eq!(body["adminRequests"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fdrd_delete_requires_owner() {
        let app = create_router(test_state());

        let (status, created) = send(
            &app,
            "POST",
            "/api/portfolio",
            Some(&user()),
            Some(json!({
                "type": "fdrd",
                "userId": OTHER_ID,
                "data": {
                    "type": "FD",
                    "bankName": "State Bank of India",
                    "principal": 100000,
                    "interestRate": 7.1,
                    "maturityDate": "2026-01-15"
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["insertedIds"][0].clone();

        let (status, _) = send(
            &app,
            "DELETE",
            "/api/portfolio",
            Some(&other_user()),
            Some(json!({ "type": "fdrd", "id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, portfolio) = send(&app, "GET", "/api/portfolio", Some(&user()), None).await;
        assert_eq!(portfolio["fdrd"].as_array().unwrap().len(), 1);
        assert_eq!(portfolio["fdrd"][0]["userId"], USER_ID);
        assert_eq!(portfolio["summary"]["fdrdTotal"], 100000.0);

        let (status, _) = send(
            &app,
            "DELETE",
            "/api/portfolio",
            Some(&user()),
            Some(json!({ "type": "fdrd", "id": id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, portfolio) = send(&app, "GET", "/api/portfolio", Some(&user()), None).await;
        assert!(portfolio["fdrd"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stocks_and_huf_pf() {
        let app = create_router(test_state());

        let (status, created) = send(
            &app,
            "POST",
            "/api/portfolio",
            Some(&user()),
            Some(json!({
                "type": "stocks",
                "data": [
                    {"symbol": "reliance", "quantity": 10, "avgPrice": 2450, "currentPrice": 2520},
                    {"symbol": "TCS", "quantity": 5, "avgPrice": 3800, "currentPrice": 3950}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["insertedIds"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            &app,
            "POST",
            "/api/portfolio",
            Some(&user()),
            Some(json!({
                "type": "stocks",
                "data": {"symbol": "TCS", "quantity": -1, "avgPrice": 1, "currentPrice": 1}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        send(
            &app,
            "POST",
            "/api/portfolio",
            Some(&user()),
            Some(json!({ "type": "hufPf", "data": { "hufPan": "aabch1234f" } })),
        )
        .await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/portfolio",
            Some(&user()),
            Some(json!({ "type": "hufPf", "data": { "epfBalance": 450000 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hufPf"]["hufPan"], "AABCH1234F");
        assert_eq!(body["hufPf"]["epfBalance"], 450000.0);

        let (_, portfolio) = send(&app, "GET", "/api/portfolio", Some(&user()), None).await;
        assert_eq!(portfolio["stocks"][0]["symbol"], "RELIANCE");
        assert_eq!(portfolio["summary"]["stocksValue"], 44950.0);
        assert_eq!(portfolio["summary"]["stocksInvested"], 43500.0);
        assert_eq!(portfolio["hufPf"]["userId"], USER_ID);
    }

    #[tokio::test]
    async fn test_only_admins_read_other_portfolios() {
        let app = create_router(test_state());
        let uri = format!("/api/portfolio?userId={}", USER_ID);

        let (status, _) = send(&app, "GET", &uri, Some(&other_user()), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, "GET", &uri, Some(&user()), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", &uri, Some(&admin()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["fdrdCount"], 0);
    }

    #[tokio::test]
    async fn test_classify_bill() {
        let app = create_router(test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/bills/classify",
            None,
            Some(json!({
                "sector": "residential",
                "billType": "electricity",
                "amount": 1850,
                "unitsConsumed": 200,
                "wattsSanctioned": 1000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bill"]["status"], "fraud");

        let (status, body) = send(
            &app,
            "POST",
            "/api/bills/classify",
            None,
            Some(json!({
                "sector": "industrial",
                "billType": "electricity",
                "amount": 1850,
                "unitsConsumed": 200,
                "wattsSanctioned": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "wattsSanctioned must be greater than zero");
    }

    #[tokio::test]
    async fn test_assistant_and_escalation() {
        let app = create_router(test_state());

        let (status, body) = send(
            &app,
            "POST",
            "/api/assistant",
            None,
            Some(json!({ "message": "Tell me a joke" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["financial"], false);

        let (_, body) = send(
            &app,
            "POST",
            "/api/assistant",
            None,
            Some(json!({ "message": "How do I save tax under 80C?" })),
        )
        .await;
        assert_eq!(body["topic"], "tax");

        let (status, body) = send(
            &app,
            "POST",
            "/api/assistant/escalate",
            Some(&user()),
            Some(json!({ "query": "Tell me a joke" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body["request"]["message"],
            "User needs assistance beyond AI capabilities. Last query: \"Tell me a joke\""
        );

        let (_, data) = send(&app, "GET", "/api/app-data", Some(&admin()), None).await;
        assert_eq!(data["adminRequests"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gst_endpoints() {
        let app = create_router(test_state());

        let (status, body) =
            send(&app, "GET", "/api/gst/forms?category=composition", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["forms"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, "GET", "/api/gst/forms?category=unknown", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/api/gst/calculate",
            None,
            Some(json!({ "amount": 1000 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1180.0);
    }

    #[tokio::test]
    async fn test_unknown_method_and_route() {
        let app = create_router(test_state());

        let (status, body) = send(&app, "GET", "/api/bills/classify", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);

        let (status, _) = send(&app, "PATCH", "/api/market-rates", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(&app, "GET", "/api/nothing-here", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered() {
        let app = create_router(test_state()).layer(cors_layer(None).unwrap());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/portfolio")
                    .header(header::ORIGIN, "https://taxora.app")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
