use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::DeploymentImpl;

pub mod admin;
pub mod growing_units;
pub mod health;
pub mod locations;
pub mod overview;
pub mod plant_species;
pub mod plants;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api = Router::new()
        .merge(health::router(&deployment))
        .merge(locations::router(&deployment))
        .merge(growing_units::router(&deployment))
        .merge(plants::router(&deployment))
        .merge(plant_species::router(&deployment))
        .merge(overview::router(&deployment))
        .merge(admin::router(&deployment));

    Router::new()
        .nest("/api", api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use services::services::config::Config;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::tenant::TENANT_HEADER;

    async fn app() -> Router {
        let deployment = DeploymentImpl::in_memory(Config::default()).await.unwrap();
        router(deployment)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        tenant: Option<Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tenant) = tenant {
            builder = builder.header(TENANT_HEADER, tenant.to_string());
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn rebuild(app: &Router, tenant: Uuid) {
        let (status, _) = send(
            app,
            Method::POST,
            "/api/admin/rebuild-read-models",
            Some(tenant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_needs_no_tenant() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn missing_or_malformed_tenant_is_unauthorized() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/locations", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let request = Request::builder()
            .uri("/api/overview")
            .header(TENANT_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let app = app().await;
        let tenant = Uuid::new_v4();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/locations",
            Some(tenant),
            Some(json!({ "name": "  ", "location_type": "garden", "description": null })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "name is required");

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/plants?status=sleeping",
            Some(tenant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_requests_get_the_error_envelope() {
        let app = app().await;
        let tenant = Uuid::new_v4();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/locations",
            Some(tenant),
            Some(json!({ "name": "Keep", "location_type": "castle", "description": null })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("castle"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/growing-units",
            Some(tenant),
            Some(json!({
                "location_id": Uuid::new_v4(),
                "name": "Pot",
                "unit_type": "pot",
                "dimensions": null
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("capacity"));

        let (status, body) =
            send(&app, Method::GET, "/api/plants/not-a-uuid", Some(tenant), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/growing-units?has_free_capacity=maybe",
            Some(tenant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn garden_lifecycle_over_http() {
        let app = app().await;
        let tenant = Uuid::new_v4();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/locations",
            Some(tenant),
            Some(json!({ "name": "Balcony", "location_type": "balcony", "description": null })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let location_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/growing-units",
            Some(tenant),
            Some(json!({
                "location_id": location_id,
                "name": "Window box",
                "unit_type": "window_box",
                "capacity": 1,
                "dimensions": { "length": 80.0, "width": 20.0, "height": 18.0, "unit": "cm" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let unit_id = body["data"]["id"].as_str().unwrap().to_string();

        let plant = json!({
            "growing_unit_id": unit_id,
            "name": "Strawberry",
            "species_id": null,
            "status": null,
            "planted_date": null,
            "notes": null
        });
        let (status, body) =
            send(&app, Method::POST, "/api/plants", Some(tenant), Some(plant.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let plant_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::POST, "/api/plants", Some(tenant), Some(plant)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/growing-units/{unit_id}"),
            Some(tenant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/plants/{plant_id}/status"),
            Some(tenant),
            Some(json!({ "status": "fruiting" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "fruiting");

        rebuild(&app, tenant).await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/plants/{plant_id}"),
            Some(tenant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["location"]["name"], "Balcony");
        assert_eq!(body["data"]["growing_unit"]["unit_type"], "window_box");

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/plants/{plant_id}"),
            Some(Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/growing-units?has_free_capacity=false",
            Some(tenant),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["items"][0]["occupancy_percentage"], 100.0);

        let (status, body) = send(&app, Method::GET, "/api/overview", Some(tenant), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["totals"]["plants"], 1);
        assert_eq!(body["data"]["plants"]["by_status"]["fruiting"], 1);
        assert_eq!(body["data"]["locations_by_type"]["balcony"], 1);
    }

    #[tokio::test]
    async fn species_conflicts_map_to_409() {
        let app = app().await;
        let tenant = Uuid::new_v4();
        let species = json!({
            "common_name": "Rosemary",
            "scientific_name": "Salvia rosmarinus",
            "family": "Lamiaceae",
            "category": "herb",
            "growth_rate": "slow",
            "sun_requirement": "full_sun",
            "water_requirement": "low",
            "ph_range": { "min": 6.0, "max": 7.5 },
            "temperature_range": null,
            "days_to_maturity": null,
            "description": null
        });

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/plant-species",
            Some(tenant),
            Some(species.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/plant-species",
            Some(tenant),
            Some(species),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
    }
}
