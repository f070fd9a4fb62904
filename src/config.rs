use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Image hosting provider identifier (Cloudinary cloud name). When
    /// absent, local-style image references are served back unresolved.
    pub cloudinary_cloud_name: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let cloudinary_cloud_name = env::var("CLOUDINARY_CLOUD_NAME")
            .ok()
            .filter(|name| !name.is_empty());
        Ok(Self {
            port,
            database_url,
            host,
            cloudinary_cloud_name,
        })
    }
}
