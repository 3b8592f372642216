use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// bcrypt hash, never the plaintext.
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub otp_secret: Option<String>,
    pub role_id: i64,
    pub confirmed: bool,
}

/// A user row before insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub otp_secret: Option<String>,
    pub role_id: i64,
    pub confirmed: bool,
}

impl NewUser {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            username: self.username,
            password: self.password_hash,
            firstname: self.firstname,
            lastname: self.lastname,
            email: self.email,
            otp_secret: self.otp_secret,
            role_id: self.role_id,
            confirmed: self.confirmed,
        }
    }
}
