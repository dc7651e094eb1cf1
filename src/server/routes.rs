use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use crate::catalog::{CatalogReport, build_catalog};
use crate::query::{EmbeddingEngine, FormattedChunks, QueryEngine, SearchMode};
use crate::server::AppState;
use crate::storage::{CatalogStats, SqliteStore};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct QueryParams {
    pub query: String,
    pub top_k: Option<usize>,
    pub vector: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub entities: usize,
    pub relations: usize,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: e.to_string() }),
    )
}

/// Run store work on the blocking pool with a connection of its own.
async fn with_store<T, F>(state: &Arc<AppState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteStore, &AppState) -> crate::Result<T> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || {
        let mut store = SqliteStore::open(&state.database_path)?;
        work(&mut store, &state)
    })
    .await
    .map_err(internal)?
    .map_err(internal)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let (entities, relations) =
        with_store(&state, |store, _| Ok((store.count_entities()?, store.count_relations()?)))
            .await
            .map_err(|(_, body)| (StatusCode::SERVICE_UNAVAILABLE, body))?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: state.database_path.display().to_string(),
        entities,
        relations,
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<CatalogStats>, ApiError> {
    let stats = with_store(&state, |store, _| store.stats()).await?;
    Ok(Json(stats))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<FormattedChunks>, ApiError> {
    if params.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: "query must not be empty".to_string() }),
        ));
    }

    let mode = if params.vector.unwrap_or(false) {
        SearchMode::Vector
    } else {
        SearchMode::Text
    };

    let chunks = with_store(&state, move |store, state| {
        let top_k = params.top_k.unwrap_or(state.config.top_k);
        match mode {
            SearchMode::Vector => {
                let embeddings = EmbeddingEngine::new()?;
                QueryEngine::new(store)
                    .with_embeddings(&embeddings)
                    .query(&params.query, top_k, mode)
            }
            SearchMode::Text => QueryEngine::new(store).query(&params.query, top_k, mode),
        }
    })
    .await?;

    Ok(Json(chunks))
}

pub async fn build(State(state): State<Arc<AppState>>) -> Result<Json<CatalogReport>, ApiError> {
    let report = with_store(&state, |store, state| {
        let taxonomy = state.config.taxonomy();
        store.begin_transaction()?;
        let report = build_catalog(&*store, &taxonomy, &state.config.databases, &state.config.data_dir);
        store.commit()?;
        Ok(report)
    })
    .await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::ddl::Dialect;
    use crate::catalog::DatabaseMeta;
    use std::path::PathBuf;

    fn state(dir: &tempfile::TempDir) -> Arc<AppState> {
        std::fs::write(
            dir.path().join("shop.sql"),
            "CREATE TABLE users (id INT PRIMARY KEY, email VARCHAR(255) NOT NULL);",
        )
        .unwrap();

        let config = CatalogConfig {
            database: dir.path().join("catalog.db"),
            data_dir: dir.path().to_path_buf(),
            databases: vec![DatabaseMeta {
                name: "shop".to_string(),
                cluster: "production".to_string(),
                dialect: Dialect::MySql,
                description: "Shop".to_string(),
                sql_file: PathBuf::from("shop.sql"),
            }],
            ..CatalogConfig::default()
        };
        Arc::new(AppState::new(config))
    }

    #[tokio::test]
    async fn test_build_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        let Json(report) = build(State(Arc::clone(&state))).await.unwrap();
        assert!(report.success);
        assert_eq!(report.tables, 1);

        let params = QueryParams {
            query: "email".to_string(),
            top_k: Some(1),
            vector: None,
        };
        let Json(chunks) = query(State(Arc::clone(&state)), Query(params)).await.unwrap();
        assert_eq!(
            chunks.entities(),
            vec!["Database:shop", "Table:shop.users", "Column:shop.users.email"]
        );

        let Json(health) = health(State(state)).await.unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.entities > 0);
        assert!(health.relations > 0);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let params = QueryParams {
            query: "  ".to_string(),
            top_k: None,
            vector: None,
        };
        let (status, _) = query(State(state(&dir)), Query(params)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
