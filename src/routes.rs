use std::{collections::HashMap, convert::Infallible, sync::Arc};

use serde::Serialize;
use serde_json::json;
use warp::{
    http::StatusCode,
    reject::Rejection,
    reply::{self, Response},
    Filter, Reply,
};

use crate::{
    form::{Form, FormData},
    jwt::SessionData,
    middleware::{with_session, Unauthorized},
    schema::NewPantryItem,
    state::AppState,
    workflows::{catalog, pantry, recipes},
};

const BODY_LIMIT: u64 = 12 * 1024 * 1024;

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_form() -> impl Filter<Extract = (Form,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_LIMIT)
        .and(warp::body::json::<FormData>())
        .map(Form::from_data)
}

fn error_reply(code: u16, info: &str) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    reply::with_status(reply::json(&json!({ "success": false, "error": info })), status)
        .into_response()
}

/// Serializes the workflow result, or the error with its own status code.
fn respond<T: Serialize>(result: Result<T, potion::Error>) -> Result<Response, Rejection> {
    Ok(match result {
        Ok(value) => reply::json(&value).into_response(),
        Err(e) => {
            let code = u16::try_from(e.code).unwrap_or(500);
            let info = e.info.unwrap_or_else(|| "Request failed".to_string());
            if code >= 500 {
                log::warn!("Request failed with {code}: {info}");
            }
            error_reply(code, &info)
        }
    })
}

// Catalog

async fn recipe_of_the_day(state: Arc<AppState>) -> Result<Response, Rejection> {
    respond(catalog::get_recipe_of_the_day(&state).await)
}

async fn categories(state: Arc<AppState>) -> Result<Response, Rejection> {
    respond(catalog::get_categories(&state).await)
}

async fn areas(state: Arc<AppState>) -> Result<Response, Rejection> {
    respond(catalog::get_areas(&state).await)
}

async fn meals_by_category(category: String, state: Arc<AppState>) -> Result<Response, Rejection> {
    respond(catalog::get_meals_by_category(&category, &state).await)
}

async fn meals_by_area(area: String, state: Arc<AppState>) -> Result<Response, Rejection> {
    respond(catalog::get_meals_by_area(&area, &state).await)
}

// Recipes

async fn resolve_recipe(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let result = match form.get_str_or_empty("recipeName") {
        Ok(name) => recipes::get_or_generate_recipe(&session, &name, &state).await,
        Err(e) => Err(e.into()),
    };
    respond(result)
}

async fn save_recipe(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let result = match form.get_uuid("recipeId") {
        Ok(id) => recipes::save_recipe_to_collection(&session, id, &state).await,
        Err(e) => Err(e),
    };
    respond(result)
}

async fn remove_recipe(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let result = match form.get_uuid("recipeId") {
        Ok(id) => recipes::remove_recipe_from_collection(&session, id, &state).await,
        Err(e) => Err(e),
    };
    respond(result)
}

async fn saved_recipes(
    session: SessionData,
    query: HashMap<String, String>,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let offset = query
        .get("offset")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    respond(recipes::get_saved_recipes(&session, offset, &state).await)
}

// Pantry

async fn pantry_items(session: SessionData, state: Arc<AppState>) -> Result<Response, Rejection> {
    respond(pantry::get_pantry_items(&session, &state).await)
}

async fn add_pantry_items(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let result = match form.get_json::<Vec<NewPantryItem>>("items") {
        Ok(items) => pantry::add_pantry_items(&session, items, &state).await,
        Err(e) => Err(e),
    };
    respond(result)
}

async fn update_pantry_item(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let fields = form.get_uuid("itemId").and_then(|id| {
        let name = form.get_str_or_empty("name")?;
        let quantity = form.get_str_or_empty("quantity")?;
        Ok((id, name, quantity))
    });

    let result = match fields {
        Ok((id, name, quantity)) => {
            pantry::update_pantry_item(&session, id, &name, &quantity, &state).await
        }
        Err(e) => Err(e),
    };
    respond(result)
}

async fn delete_pantry_item(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let result = match form.get_uuid("itemId") {
        Ok(id) => pantry::delete_pantry_item(&session, id, &state).await,
        Err(e) => Err(e),
    };
    respond(result)
}

async fn pantry_suggestions(
    session: SessionData,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    respond(pantry::get_recipes_by_pantry_ingredients(&session, &state).await)
}

async fn scan_pantry(
    session: SessionData,
    form: Form,
    state: Arc<AppState>,
) -> Result<Response, Rejection> {
    let fields = form.get_str("image").and_then(|image| {
        let mime_type = form.get_str_or_empty("mimeType")?;
        Ok((image, mime_type))
    });

    let result = match fields {
        Ok((image, mime_type)) => {
            pantry::scan_pantry_image(&session, &image, &mime_type, &state).await
        }
        Err(e) => Err(e.into()),
    };
    respond(result)
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply(404, "Not found"));
    }
    if err.find::<Unauthorized>().is_some() {
        return Ok(error_reply(401, "Unauthorized"));
    }
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(400, &e.to_string()));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(413, "Payload too large"));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(405, "Method not allowed"));
    }

    log::error!("Unhandled rejection: {err:?}");
    Ok(error_reply(500, "Internal server error"))
}

/// Every endpoint, with rejections turned into JSON errors.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone {
    let session = with_session(state.session_secret.clone());

    let catalog_routes = warp::get().and(
        warp::path!("api" / "catalog" / "recipe-of-the-day")
            .and(with_state(state.clone()))
            .and_then(recipe_of_the_day)
            .or(warp::path!("api" / "catalog" / "categories")
                .and(with_state(state.clone()))
                .and_then(categories))
            .unify()
            .or(warp::path!("api" / "catalog" / "areas")
                .and(with_state(state.clone()))
                .and_then(areas))
            .unify()
            .or(warp::path!("api" / "catalog" / "categories" / String)
                .and(with_state(state.clone()))
                .and_then(meals_by_category))
            .unify()
            .or(warp::path!("api" / "catalog" / "areas" / String)
                .and(with_state(state.clone()))
                .and_then(meals_by_area))
            .unify(),
    );

    let recipe_routes = warp::post()
        .and(
            warp::path!("api" / "recipes" / "resolve")
                .and(session.clone())
                .and(json_form())
                .and(with_state(state.clone()))
                .and_then(resolve_recipe)
                .or(warp::path!("api" / "recipes" / "save")
                    .and(session.clone())
                    .and(json_form())
                    .and(with_state(state.clone()))
                    .and_then(save_recipe))
                .unify()
                .or(warp::path!("api" / "recipes" / "remove")
                    .and(session.clone())
                    .and(json_form())
                    .and(with_state(state.clone()))
                    .and_then(remove_recipe))
                .unify(),
        )
        .or(warp::get()
            .and(warp::path!("api" / "recipes" / "saved"))
            .and(session.clone())
            .and(warp::query::<HashMap<String, String>>())
            .and(with_state(state.clone()))
            .and_then(saved_recipes))
        .unify();

    let pantry_routes = warp::get()
        .and(warp::path!("api" / "pantry"))
        .and(session.clone())
        .and(with_state(state.clone()))
        .and_then(pantry_items)
        .or(warp::post().and(
            warp::path!("api" / "pantry")
                .and(session.clone())
                .and(json_form())
                .and(with_state(state.clone()))
                .and_then(add_pantry_items)
                .or(warp::path!("api" / "pantry" / "update")
                    .and(session.clone())
                    .and(json_form())
                    .and(with_state(state.clone()))
                    .and_then(update_pantry_item))
                .unify()
                .or(warp::path!("api" / "pantry" / "delete")
                    .and(session.clone())
                    .and(json_form())
                    .and(with_state(state.clone()))
                    .and_then(delete_pantry_item))
                .unify()
                .or(warp::path!("api" / "pantry" / "suggestions")
                    .and(session.clone())
                    .and(with_state(state.clone()))
                    .and_then(pantry_suggestions))
                .unify()
                .or(warp::path!("api" / "pantry" / "scan")
                    .and(session)
                    .and(json_form())
                    .and(with_state(state))
                    .and_then(scan_pantry))
                .unify(),
        ))
        .unify();

    catalog_routes
        .or(recipe_routes)
        .unify()
        .or(pantry_routes)
        .unify()
        .recover(handle_rejection)
        .unify()
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{
        jwt::generate_jwt_session, llm::FakeProvider, memory::MemoryStore, schema::PlanTier,
        test_support::EmptyCatalog,
    };

    const SECRET: &str = "routes-secret";

    fn state() -> Arc<AppState> {
        let provider = FakeProvider::new().with_response(
            "write a complete recipe",
            r#"{"title": "Toast", "ingredients": [{"item": "bread", "amount": "2 slices"}],
                "instructions": [{"step": 1, "title": "Toast", "instruction": "Toast the bread"}]}"#,
        );
        Arc::new(AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(provider),
            Arc::new(EmptyCatalog),
            SECRET,
        ))
    }

    fn bearer(user_id: &str) -> String {
        let Ok(token) = generate_jwt_session(user_id, PlanTier::Free, SECRET.as_bytes()) else {
            panic!("signing failed");
        };
        format!("Bearer {token}")
    }

    fn body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn catalog_is_public() {
        let response = warp::test::request()
            .path("/api/catalog/categories")
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(body(response.body())["categories"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn pantry_requires_a_session() {
        let response = warp::test::request()
            .path("/api/pantry")
            .reply(&routes(state()))
            .await;

        assert_eq!(response.status(), 401);
        assert_eq!(body(response.body())["success"], false);
    }

    #[tokio::test]
    async fn resolves_and_saves_a_recipe() {
        let routes = routes(state());

        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/resolve")
            .header("authorization", bearer("user_1"))
            .json(&json!({ "recipeName": "Toast" }))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 200);
        let resolved = body(response.body());
        assert_eq!(resolved["fromDatabase"], false);

        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/save")
            .header("authorization", bearer("user_1"))
            .json(&json!({ "recipeId": resolved["recipeId"] }))
            .reply(&routes)
            .await;
        assert_eq!(body(response.body())["alreadySaved"], false);

        let response = warp::test::request()
            .path("/api/recipes/saved")
            .header("authorization", bearer("user_1"))
            .reply(&routes)
            .await;
        assert_eq!(body(response.body())["totalRows"], 1);
    }

    #[tokio::test]
    async fn workflow_errors_keep_their_status() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/recipes/resolve")
            .header("authorization", bearer("user_1"))
            .json(&json!({ "recipeName": "  " }))
            .reply(&routes(state()))
            .await;

        assert!(response.status().is_client_error());
        let reply = body(response.body());
        assert_eq!(reply["success"], false);
        assert!(reply["error"].is_string());
    }

    #[tokio::test]
    async fn empty_pantry_suggestions_are_unsuccessful() {
        let response = warp::test::request()
            .method("POST")
            .path("/api/pantry/suggestions")
            .header("authorization", bearer("user_1"))
            .reply(&routes(state()))
            .await;

        let reply = body(response.body());
        assert_eq!(reply["success"], false);
        assert_eq!(reply["recipes"], json!([]));
        assert_eq!(reply["recommendationsLimit"], 5);
    }
}
