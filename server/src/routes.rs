use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    error::AppError,
    fields::{RawValue, RecordKind, SENTINEL, update_field},
    finances::{Finance, FinanceStore, NewFinance},
    posts::{Post, PostStore, PostWithAuthor, author_projection, matches_search},
    state::State,
    store::RedisFieldStore,
    upload::{transform_url, validate_image},
};

/// Identity forwarded by the reverse proxy after it verified the session
/// cookie. Routes that act on behalf of a user require it.
fn session_user(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get("x-user-id")
        .and_then(|valor| valor.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(AppError::Unauthenticated)
}

#[derive(Debug)]
pub struct UpdateRequest {
    pub user_id: String,
    pub valor: RawValue,
    pub campo: String,
    pub tabela: RecordKind,
}

/// Applies the endpoint's validation order: parameter shape first (listing
/// every offender), then the table literal, then the empty-value sentinel.
pub fn parse_update_request(body: &Value) -> Result<UpdateRequest, AppError> {
    let mut faltantes = Vec::new();

    if !body.get("userId").is_some_and(Value::is_string) {
        faltantes.push("userId");
    }

    let valor_valido = matches!(body.get("valor"), Some(Value::String(_) | Value::Bool(_)));
    if !valor_valido {
        faltantes.push("valor");
    }

    if !body.get("campo").is_some_and(Value::is_string) {
        faltantes.push("campo");
    }

    if !body.get("tabela").is_some_and(Value::is_string) {
        faltantes.push("tabela");
    }

    if !faltantes.is_empty() {
        return Err(AppError::InvalidParams(faltantes.join(", ")));
    }

    let tabela = body["tabela"]
        .as_str()
        .and_then(RecordKind::from_name)
        .ok_or(AppError::InvalidTable)?;

    let valor = match body.get("valor") {
        Some(Value::Bool(flag)) => RawValue::Flag(*flag),
        Some(Value::String(texto)) if texto.is_empty() => RawValue::Text(SENTINEL.to_string()),
        Some(Value::String(texto)) => RawValue::Text(texto.clone()),
        _ => return Err(AppError::InvalidParams("valor".to_string())),
    };

    Ok(UpdateRequest {
        user_id: body["userId"].as_str().unwrap_or_default().to_string(),
        valor,
        campo: body["campo"].as_str().unwrap_or_default().to_string(),
        tabela,
    })
}

pub async fn update_bio_handler(
    AxumState(state): AxumState<Arc<State>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let pedido = parse_update_request(&body)?;
    let store = RedisFieldStore::new(state.redis_connection.clone());

    let update = update_field(
        &store,
        pedido.tabela,
        &pedido.campo,
        pedido.valor,
        &pedido.user_id,
    )
    .await?;

    #[cfg(feature = "verbose")]
    tracing::info!(
        "Campo {} gravado em {} (created={})",
        update.campo,
        pedido.tabela.name(),
        update.created
    );

    Ok(Json(
        json!({ "message": format!("{} atualizado com sucesso!", update.campo) }),
    ))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

pub async fn list_posts_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PostWithAuthor>>, AppError> {
    let posts = PostStore::new(state.redis_connection.clone()).list().await?;
    let fields = RedisFieldStore::new(state.redis_connection.clone());

    let mut feed = Vec::with_capacity(posts.len());
    for post in posts {
        let author = author_projection(&fields, &post.author_id).await?;

        if let Some(termo) = params.search.as_deref() {
            if !matches_search(&post, author.as_ref(), termo) {
                continue;
            }
        }

        feed.push(PostWithAuthor { post, author });
    }

    Ok(Json(feed))
}

#[derive(Default)]
struct PostForm {
    title: Option<String>,
    content: Option<String>,
    image_position: Option<String>,
    title_alignment: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::MalformedPayload)?
    {
        let nome = field.name().unwrap_or_default().to_string();

        match nome.as_str() {
            "title" => form.title = Some(field.text().await.map_err(|_| AppError::MalformedPayload)?),
            "content" => {
                form.content = Some(field.text().await.map_err(|_| AppError::MalformedPayload)?)
            }
            "imagePosition" => {
                form.image_position =
                    Some(field.text().await.map_err(|_| AppError::MalformedPayload)?)
            }
            "titleAlignment" => {
                form.title_alignment =
                    Some(field.text().await.map_err(|_| AppError::MalformedPayload)?)
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("imagem").to_string();
                let bytes = field.bytes().await.map_err(|_| AppError::MalformedPayload)?;

                form.image = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn create_post_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = session_user(&headers)?;
    let form = read_post_form(multipart).await?;

    let title = form.title.unwrap_or_default();
    let content = form.content.unwrap_or_default();
    if title.is_empty() || content.is_empty() {
        return Err(AppError::MissingTitleOrContent);
    }

    let mut image = None;
    if let Some((file_name, bytes)) = form.image {
        validate_image(&file_name, bytes.len())?;
        image = Some(state.uploader.upload(bytes, &file_name, "posts").await?);
    }

    let post = Post {
        id: Uuid::new_v4().to_string(),
        title,
        content,
        image,
        image_position: form.image_position,
        title_alignment: form.title_alignment,
        author_id: user_id,
        created_at: Utc::now(),
    };

    PostStore::new(state.redis_connection.clone())
        .save(&post)
        .await?;

    let fields = RedisFieldStore::new(state.redis_connection.clone());
    let author = author_projection(&fields, &post.author_id).await?;

    Ok((StatusCode::CREATED, Json(PostWithAuthor { post, author })))
}

pub async fn get_post_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<String>,
) -> Result<Json<Post>, AppError> {
    PostStore::new(state.redis_connection.clone())
        .get(&id)
        .await?
        .map(Json)
        .ok_or(AppError::PostNotFound)
}

pub async fn update_post_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let store = PostStore::new(state.redis_connection.clone());
    let mut post = store.get(&id).await?.ok_or(AppError::PostNotFound)?;

    let form = read_post_form(multipart).await?;

    if let Some(title) = form.title {
        post.title = title;
    }
    if let Some(content) = form.content {
        post.content = content;
    }
    post.image_position = form.image_position.or(post.image_position);
    post.title_alignment = form.title_alignment.or(post.title_alignment);

    if let Some((file_name, bytes)) = form.image {
        validate_image(&file_name, bytes.len())?;
        post.image = Some(state.uploader.upload(bytes, &file_name, "posts").await?);
    }

    store.save(&post).await?;

    Ok((StatusCode::OK, "Post atualizado com sucesso!"))
}

pub async fn delete_post_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removido = PostStore::new(state.redis_connection.clone())
        .delete(&id)
        .await?;

    if !removido {
        return Err(AppError::PostNotFound);
    }

    Ok((StatusCode::OK, "Post deletado com sucesso!"))
}

pub async fn list_finances_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<Vec<Finance>>, AppError> {
    let lancamentos = FinanceStore::new(state.redis_connection.clone())
        .list()
        .await?;

    Ok(Json(lancamentos))
}

pub async fn create_finance_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
    Json(novo): Json<NewFinance>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = session_user(&headers)?;

    let lancamento = Finance {
        id: Uuid::new_v4().to_string(),
        user_id,
        sentido: novo.sentido,
        criado_em: Some(Utc::now()),
        valor: novo.valor,
    };

    FinanceStore::new(state.redis_connection.clone())
        .save(&lancamento)
        .await?;

    Ok((StatusCode::CREATED, Json(lancamento)))
}

pub async fn upload_media_handler(
    AxumState(state): AxumState<Arc<State>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let user_id = session_user(&headers)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::MalformedPayload)?
    {
        let campo = match field.name() {
            Some("banner") => "banner",
            Some("image") => "image",
            _ => continue,
        };

        let file_name = field.file_name().unwrap_or("imagem").to_string();
        let bytes = field.bytes().await.map_err(|_| AppError::MalformedPayload)?;

        upload = Some((campo, file_name, bytes.to_vec()));
        break;
    }

    let Some((campo, file_name, bytes)) = upload else {
        return Err(AppError::NoValidImage);
    };

    validate_image(&file_name, bytes.len())?;

    let url = state
        .uploader
        .upload(bytes, &file_name, "profile-media")
        .await?;
    let url = transform_url(&url);

    let store = RedisFieldStore::new(state.redis_connection.clone());
    update_field(
        &store,
        RecordKind::User,
        campo,
        RawValue::Text(url.clone()),
        &user_id,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Upload concluído com sucesso!",
        "campo": campo,
        "url": url,
    })))
}
