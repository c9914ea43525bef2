use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stanza::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

/// In-memory user storage.
pub struct UserService {
    users: Mutex<HashMap<String, User>>,
}

impl Injectable for UserService {
    fn construct(_deps: &Deps<'_>) -> Result<Self> {
        Ok(Self {
            users: Mutex::new(HashMap::new()),
        })
    }
}

impl UserService {
    pub fn create(&self, name: String) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
        };
        self.users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        user
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }

    pub fn list(&self) -> Vec<User> {
        self.users.lock().unwrap().values().cloned().collect()
    }
}

pub struct UserApi {
    service: Arc<UserService>,
}

impl Injectable for UserApi {
    fn dependencies() -> Vec<Target> {
        vec![Target::of::<UserService>()]
    }

    fn construct(deps: &Deps<'_>) -> Result<Self> {
        Ok(Self { service: deps.get(0)? })
    }
}

pub fn register(store: &Store) {
    Api::<UserApi>::new("/users")
        .member(
            Member::new("create", |api: Arc<UserApi>, args: Args| async move {
                let req: CreateUserRequest = args
                    .json(0)
                    .ok_or_else(|| HttpError::unprocessable("name: is required"))?;
                Ok(Reply::json(&api.service.create(req.name))?)
            })
            .route(HttpMethod::Post, "/", StatusCode::CREATED)
            .param(0, ParamSource::Body, None)
            .validation(create_user_schema()),
        )
        .member(
            Member::new("get_one", |api: Arc<UserApi>, args: Args| async move {
                let id = args.string(0).unwrap_or_default();
                match api.service.get(&id) {
                    Some(user) => Ok(Reply::json(&user)?),
                    None => Err(HttpError::not_found(format!("user {id} does not exist")).into()),
                }
            })
            .get("/{id}")
            .param(0, ParamSource::PathParams, Some("id")),
        )
        .member(
            Member::new("list", |api: Arc<UserApi>, _args: Args| async move {
                Ok(Reply::json(&api.service.list())?)
            })
            .get("/"),
        )
        .register(store);
}

/// Request body must carry a non-empty `name` of at most 32 characters.
fn create_user_schema() -> Arc<dyn Schema> {
    schema_fn(|payload| match payload.body.get("name").and_then(Value::as_str) {
        Some(name) if name.is_empty() => Err(vec![ValidationIssue::new(
            ["body", "name"],
            "must not be empty",
        )]),
        Some(name) if name.len() > 32 => Err(vec![ValidationIssue::new(
            ["body", "name"],
            "must be at most 32 characters",
        )]),
        Some(_) => Ok(()),
        None => Err(vec![ValidationIssue::new(["body", "name"], "is required")]),
    })
}
