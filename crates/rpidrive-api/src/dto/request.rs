//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use rpidrive_entity::volume::VolumeKind;
use rpidrive_service::user::CreateUserRequest as CreateUser;
use rpidrive_service::volume::CreateVolumeRequest as CreateVolume;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Create user request (admin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
            is_superuser: req.is_superuser,
            is_active: req.is_active,
        }
    }
}

/// Create volume request (admin).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVolumeRequest {
    #[validate(length(min = 1, message = "Volume name is required"))]
    pub name: String,
    pub kind: VolumeKind,
    #[validate(length(min = 1, message = "Volume path is required"))]
    pub path: String,
}

impl From<CreateVolumeRequest> for CreateVolume {
    fn from(req: CreateVolumeRequest) -> Self {
        Self {
            name: req.name,
            kind: req.kind,
            path: req.path,
        }
    }
}

/// A body carrying just a name: new folder, rename, new playlist.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NameRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// A list of file IDs, e.g. for bulk delete.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilesRequest {
    #[validate(length(min = 1, message = "No files selected"))]
    pub files: Vec<Uuid>,
}

/// `?fields=volume,parent,children,path`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldsQuery {
    pub fields: Option<String>,
}

/// `?keyword=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

/// `?key=<link id>`; kept as text so a malformed key is a 404, not a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickAccessQuery {
    pub key: Option<String>,
}

impl QuickAccessQuery {
    pub fn link_id(&self) -> Option<Uuid> {
        self.key.as_deref().and_then(|k| Uuid::parse_str(k.trim()).ok())
    }
}
