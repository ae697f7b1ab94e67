// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::CredentialStore,
    models::auth::{Claims, CreateUserForm, NewSystemUser, Role, SystemUser},
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    session_secret: String,
    session_ttl: chrono::Duration,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        session_secret: String,
        session_ttl: chrono::Duration,
        hash_cost: u32,
    ) -> Self {
        Self { users, session_secret, session_ttl, hash_cost }
    }

    /// Confere usuário e senha. Qualquer falha vira `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<SystemUser, AppError> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        .unwrap_or(false); // hash corrompido no banco conta como senha errada

        if !is_password_valid {
            tracing::warn!("Tentativa de login inválida para '{}'", username);
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Login de '{}' ({})", user.username, user.role);
        Ok(user)
    }

    /// `admin` passa por qualquer exigência; os demais só pelo próprio papel.
    pub fn authorize(user: &SystemUser, required: Role) -> bool {
        user.role == Role::Admin || user.role == required
    }

    pub fn create_session_token(&self, user: &SystemUser) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            rep_code: user.rep_code,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.session_secret.as_ref()),
        )?)
    }

    /// Recarrega o usuário da sessão. Token inválido ou usuário removido
    /// significam "não autenticado".
    pub async fn resolve_session(&self, token: &str) -> Result<SystemUser, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.session_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthenticated)?;

        self.users
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::Unauthenticated)
    }

    pub async fn list_users(&self) -> Result<Vec<SystemUser>, AppError> {
        self.users.list_users().await
    }

    /// Valida o formulário e cria o usuário. Todas as regras são checadas
    /// antes de qualquer escrita.
    pub async fn create_user(&self, form: CreateUserForm) -> Result<(), AppError> {
        // O tamanho vale para o nome sem espaços nas pontas
        let form = CreateUserForm { username: form.username.trim().to_string(), ..form };
        form.validate()?;

        let role: Role = form.role.parse().map_err(|_| AppError::InvalidRole)?;

        let rep_code = match form.codigo_trimmed() {
            Some(code) => Some(code.parse::<i32>().map_err(|_| AppError::InvalidRepCode)?),
            None => None,
        };

        if role == Role::Vendedor && rep_code.is_none() {
            return Err(AppError::RepCodeRequired);
        }

        let username = form.username;
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(AppError::UsernameAlreadyExists);
        }

        let password_hash = self.hash_password(form.password).await?;

        self.users
            .create_user(NewSystemUser { username: username.clone(), password_hash, role, rep_code })
            .await?;

        tracing::info!("👤 Usuário '{}' criado ({})", username, role);
        Ok(())
    }

    pub async fn delete_user(&self, actor: &SystemUser, target_id: i32) -> Result<(), AppError> {
        if actor.id == target_id {
            return Err(AppError::SelfDeletion);
        }

        match self.users.delete_user(target_id).await? {
            0 => Err(AppError::UserNotFound),
            _ => {
                tracing::info!("🗑️ Usuário {} removido por '{}'", target_id, actor.username);
                Ok(())
            }
        }
    }

    /// Garante a existência do administrador inicial. Retorna `true` se criou.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, AppError> {
        if self.users.find_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let password_hash = self.hash_password(password.to_owned()).await?;
        self.users
            .create_user(NewSystemUser {
                username: username.to_string(),
                password_hash,
                role: Role::Admin,
                rep_code: None,
            })
            .await?;

        tracing::info!("👤 Administrador inicial '{}' criado", username);
        Ok(true)
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let cost = self.hash_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }
}
