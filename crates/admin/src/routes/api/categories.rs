//! Category API handlers.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde::de::DeserializeOwned;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::{Deserialize, Serialize};

use backoffice_core::{Category, CategoryId};

use crate::error::AppError;
use crate::models::category::{
    CategoryFilter, CategoryPage, CategorySort, CreateCategoryInput, SortDirection, SortField,
    UpdateCategoryInput,
};
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/categories",
            get(list_categories).post(create_category),
        )
        .route(
            "/api/admin/categories/{id}",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/api/admin/categories/{id}/children", get(list_children))
}

// =============================================================================
// Request / response types
// =============================================================================

/// Query string for the listing. Values arrive as raw strings so malformed
/// ones produce the JSON error envelope instead of a plain-text rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub level: Option<String>,
    pub is_active: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// Resolved listing parameters.
#[derive(Debug, PartialEq, Eq)]
pub struct ListParams {
    pub filter: CategoryFilter,
    pub sort: CategorySort,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    /// Parse raw query values.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first malformed parameter.
    pub fn into_params(self) -> Result<ListParams, AppError> {
        // Matched as typed; surrounding spaces are part of the needle.
        let search = self.search.filter(|v| !v.is_empty());
        let level = parse_number("level", present(self.level))?;
        let is_active = match present(self.is_active).as_deref() {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => return Err(bad_param("isActive", other)),
        };
        let page = parse_number("page", present(self.page))?;
        let limit = parse_number("limit", present(self.limit))?;
        let field = parse_enum::<SortField>("sortBy", present(self.sort_by))?;
        let direction = parse_enum::<SortDirection>("order", present(self.order))?;

        Ok(ListParams {
            filter: CategoryFilter {
                search,
                level,
                is_active,
            },
            sort: CategorySort {
                field: field.unwrap_or_default(),
                direction: direction.unwrap_or_default(),
            },
            page,
            limit,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, AppError> {
    raw.map(|v| v.parse::<T>().map_err(|_| bad_param(name, &v)))
        .transpose()
}

fn parse_enum<T: DeserializeOwned>(name: &str, raw: Option<String>) -> Result<Option<T>, AppError> {
    raw.map(|v| {
        T::deserialize(StrDeserializer::<ValueError>::new(v.as_str()))
            .map_err(|_| bad_param(name, &v))
    })
    .transpose()
}

fn bad_param(name: &str, value: &str) -> AppError {
    AppError::BadRequest(format!("Invalid value for {name}: {value}"))
}

fn parse_id(raw: &str) -> Result<CategoryId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid category ID".to_string()))
}

/// Response envelope for single-record and message responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    fn with_message(data: Option<T>, message: &'static str) -> Self {
        Self {
            success: true,
            data,
            message: Some(message),
        }
    }
}

/// Response envelope for the paginated listing.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub data: Vec<Category>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl From<CategoryPage> for ListResponse {
    fn from(page: CategoryPage) -> Self {
        Self {
            success: true,
            data: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            pages: page.pages,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List categories.
///
/// # Errors
///
/// Returns 400 for malformed query parameters.
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let params = query.into_params()?;
    let page = state
        .categories()
        .list(params.filter, params.sort, params.page, params.limit)
        .await?;
    Ok(Json(page.into()))
}

/// Create a category.
///
/// # Errors
///
/// Returns 400 for invalid input and 404 for an unknown parent.
pub async fn create_category(
    State(state): State<AppState>,
    body: Result<Json<CreateCategoryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), AppError> {
    let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let category = state.categories().create(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            Some(category),
            "Category created successfully",
        )),
    ))
}

/// Fetch one category.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let category = state.categories().get(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::data(category)))
}

/// Partially update a category.
///
/// # Errors
///
/// Returns 400 for invalid input or parent, 404 for unknown ids.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateCategoryInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let id = parse_id(&id)?;
    let Json(input) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let category = state.categories().update(id, input).await?;

    Ok(Json(ApiResponse::with_message(
        Some(category),
        "Category updated successfully",
    )))
}

/// Delete a childless category.
///
/// # Errors
///
/// Returns 400 if it has subcategories, 404 if it does not exist.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.categories().delete(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::with_message(
        None,
        "Category deleted successfully",
    )))
}

/// Direct subcategories of a category.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
pub async fn list_children(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    let children = state.categories().children(Some(parse_id(&id)?)).await?;
    Ok(Json(ApiResponse::data(children)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let encoded: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let Query(query) =
            Query::<ListQuery>::try_from_uri(&format!("/x?{}", encoded.join("&")).parse().unwrap())
                .unwrap();
        query
    }

    #[test]
    fn test_list_query_defaults() {
        let params = query(&[]).into_params().unwrap();
        assert_eq!(params.filter, CategoryFilter::default());
        assert_eq!(params.sort, CategorySort::default());
        assert_eq!(params.page, None);
        assert_eq!(params.limit, None);
    }

    #[test]
    fn test_list_query_full() {
        let params = query(&[
            ("search", "shoe"),
            ("level", "1"),
            ("isActive", "false"),
            ("page", "2"),
            ("limit", "25"),
            ("sortBy", "name"),
            ("order", "asc"),
        ])
        .into_params()
        .unwrap();

        assert_eq!(params.filter.search.as_deref(), Some("shoe"));
        assert_eq!(params.filter.level, Some(1));
        assert_eq!(params.filter.is_active, Some(false));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(25));
        assert_eq!(params.sort.field, SortField::Name);
        assert_eq!(params.sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_list_query_blank_values_ignored() {
        let params = query(&[("search", ""), ("level", ""), ("isActive", "")])
            .into_params()
            .unwrap();
        assert_eq!(params.filter, CategoryFilter::default());
    }

    #[test]
    fn test_list_query_search_kept_verbatim() {
        let params = query(&[("search", "%20shoe")]).into_params().unwrap();
        assert_eq!(params.filter.search.as_deref(), Some(" shoe"));
    }

    #[test]
    fn test_list_query_rejects_malformed() {
        for pair in [
            ("level", "one"),
            ("isActive", "yes"),
            ("page", "x"),
            ("sortBy", "price"),
            ("order", "up"),
        ] {
            let err = query(&[pair]).into_params().unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{pair:?}");
        }
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12").unwrap(), CategoryId::new(12));
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::<()>::with_message(
            None,
            "Category deleted successfully",
        ))
        .unwrap();
        assert_eq!(
            body,
            json!({"success": true, "message": "Category deleted successfully"})
        );

        let list = serde_json::to_value(ListResponse::from(CategoryPage::new(
            Vec::new(),
            15,
            2,
            10,
        )))
        .unwrap();
        assert_eq!(
            list,
            json!({"success": true, "data": [], "total": 15, "page": 2, "limit": 10, "pages": 2})
        );
    }
}
