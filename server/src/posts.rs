//! Community feed posts: JSON documents in Redis plus a time-scored index
//! for newest-first listing. Author data is projected out of the `user:<id>`
//! record hash at read time, never denormalized into the post.
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};

use crate::{
    fields::RecordKind,
    store::{FieldStore, StoreError},
};

const POSTS_INDEX: &str = "posts:index";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub image_position: Option<String>,
    pub title_alignment: Option<String>,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// Fields the feed exposes about an author.
#[derive(Clone, Debug, Serialize)]
pub struct Author {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<Author>,
}

pub async fn author_projection<S: FieldStore>(
    store: &S,
    author_id: &str,
) -> Result<Option<Author>, StoreError> {
    let Some(campos) = store.fetch(RecordKind::User, author_id).await? else {
        return Ok(None);
    };

    Ok(Some(Author {
        id: author_id.to_string(),
        name: campos.get("name").cloned(),
        image: campos.get("image").cloned(),
        email: campos.get("email").cloned(),
    }))
}

/// Case-insensitive feed filter over the post title and the author name.
pub fn matches_search(post: &Post, author: Option<&Author>, termo: &str) -> bool {
    let termo = termo.to_lowercase();

    if post.title.to_lowercase().contains(&termo) {
        return true;
    }

    author
        .and_then(|autor| autor.name.as_deref())
        .map(|nome| nome.to_lowercase().contains(&termo))
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct PostStore {
    connection: ConnectionManager,
}

impl PostStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    fn key(id: &str) -> String {
        format!("post:{id}")
    }

    pub async fn save(&self, post: &Post) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let documento = serde_json::to_string(post)?;

        let _: () = connection.set(Self::key(&post.id), documento).await?;
        let _: () = connection
            .zadd(POSTS_INDEX, &post.id, post.created_at.timestamp_millis())
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Post>, StoreError> {
        let mut connection = self.connection.clone();

        let documento: Option<String> = connection.get(Self::key(id)).await?;

        documento
            .map(|doc| serde_json::from_str(&doc).map_err(StoreError::from))
            .transpose()
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();

        let removidos: usize = connection.del(Self::key(id)).await?;
        let _: () = connection.zrem(POSTS_INDEX, id).await?;

        Ok(removidos > 0)
    }

    /// All posts, newest first.
    pub async fn list(&self) -> Result<Vec<Post>, StoreError> {
        let mut connection = self.connection.clone();

        let ids: Vec<String> = connection.zrevrange(POSTS_INDEX, 0, -1).await?;

        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(post) = self.get(&id).await? {
                posts.push(post);
            }
        }

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str) -> Post {
        Post {
            id: "p1".into(),
            title: title.into(),
            content: "conteúdo".into(),
            image: None,
            image_position: None,
            title_alignment: None,
            author_id: "u1".into(),
            created_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_matches_search_on_title_and_author() {
        let alvo = post("Retiro de Verão");
        let autor = Author {
            id: "u1".into(),
            name: Some("Maria Silva".into()),
            image: None,
            email: None,
        };

        assert!(matches_search(&alvo, Some(&autor), "verão"));
        assert!(matches_search(&alvo, Some(&autor), "silva"));
        assert!(!matches_search(&alvo, Some(&autor), "carnaval"));
        assert!(!matches_search(&alvo, None, "silva"));
    }
}
