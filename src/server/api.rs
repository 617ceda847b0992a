//! JSON views backed by the model layer rather than a file.

use crate::db::DbActorHandle;
use crate::error::PorticoError;
use crate::models::{get_user, list_users};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiView {
    /// `api/user?id=N`
    User,
    /// `api/users`
    Users,
}

impl ApiView {
    pub fn lookup(path: &str) -> Option<Self> {
        match path {
            "api/user" => Some(ApiView::User),
            "api/users" => Some(ApiView::Users),
            _ => None,
        }
    }

    /// `Ok(None)` when the requested record does not exist.
    pub async fn render(
        self,
        db: &DbActorHandle,
        query: Option<&str>,
    ) -> Result<Option<Vec<u8>>, PorticoError> {
        match self {
            ApiView::User => {
                let Some(id) = query_param(query, "id").and_then(|v| v.parse::<i64>().ok())
                else {
                    return Ok(None);
                };
                match get_user(db, id).await? {
                    Some(user) => Ok(Some(serde_json::to_vec(&user)?)),
                    None => Ok(None),
                }
            }
            ApiView::Users => {
                let users = list_users(db).await?;
                Ok(Some(serde_json::to_vec(&users)?))
            }
        }
    }
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query.and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    })
}
