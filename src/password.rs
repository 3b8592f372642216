use crate::error::BootstrapError;

/// Lowest and highest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt hasher. Every call to [`PasswordHasher::hash`] draws a fresh salt.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, BootstrapError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(BootstrapError::InvalidConfig(format!(
                "bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
            )));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash on the blocking pool; bcrypt is deliberately slow.
    pub async fn hash(&self, plain: &str) -> Result<String, BootstrapError> {
        let cost = self.cost;
        let plain = plain.to_owned();
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
        Ok(hashed)
    }

    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        bcrypt::verify(plain, hash).unwrap_or(false)
    }
}
