//! Operator endpoints

use crate::api::{ExtractBearer, ExtractUser};
use crate::core::menu::NO_ACCESS_TEXT;
use crate::core::statistics::StatisticsReport;
use crate::infrastructure::settings::Settings;
use crate::infrastructure::traits::EventStore;
use axum::http::{Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use log::{error, info, warn};
use tower_http::cors::{Any, CorsLayer};

const RECENT_INTAKES: i64 = 50;

pub fn router() -> Router {
    Router::new()
        .route("/statistics", get(statistics))
        .route("/intakes", get(intakes))
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET])
                .allow_origin(Any),
        )
}

type Rejection = (StatusCode, &'static str);

/// Requires the shared operator token and the operator's own identity.
fn authorize(settings: &Settings, token: &str, identity: i64) -> Result<(), Rejection> {
    if settings.operator_api_token.as_deref() != Some(token) {
        warn!("operator API rejected a request with a wrong token");
        return Err((StatusCode::UNAUTHORIZED, "invalid bearer token"));
    }

    if identity == settings.operator_id {
        Ok(())
    } else {
        info!("operator API denied for {identity}");
        Err((StatusCode::FORBIDDEN, NO_ACCESS_TEXT))
    }
}

async fn statistics(
    Inject(store): Inject<dyn EventStore>,
    Inject(settings): Inject<Settings>,
    ExtractBearer(token): ExtractBearer,
    ExtractUser(identity): ExtractUser,
) -> Result<Json<StatisticsReport>, Rejection> {
    authorize(&settings, &token, identity)?;

    let statistics = store.statistics().await.map_err(|e| {
        error!("{e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "statistics unavailable")
    })?;

    Ok(Json(StatisticsReport::from(statistics)))
}

async fn intakes(
    Inject(store): Inject<dyn EventStore>,
    Inject(settings): Inject<Settings>,
    ExtractBearer(token): ExtractBearer,
    ExtractUser(identity): ExtractUser,
) -> Result<Json<Vec<schemas::Intake>>, Rejection> {
    authorize(&settings, &token, identity)?;

    let intakes = store.recent_intakes(RECENT_INTAKES).await.map_err(|e| {
        error!("{e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "intakes unavailable")
    })?;

    Ok(Json(intakes.into_iter().map(schemas::Intake::from).collect()))
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    pub struct Intake {
        pub id: i64,
        pub user_id: i64,
        pub phone: String,
        pub created_at: DateTime<Utc>,
        pub status: String,
    }

    impl From<entities::IntakeRecord> for Intake {
        fn from(intake: entities::IntakeRecord) -> Self {
            Intake {
                id: intake.id,
                user_id: intake.user_identity,
                phone: intake.phone,
                created_at: intake.created_at,
                status: intake.status,
            }
        }
    }
}
