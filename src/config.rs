use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Public base URL used to build payment callback links.
    pub app_base_url: String,
    /// Absent keys surface as a well-defined gateway error at call time,
    /// never as a startup crash.
    pub paystack_secret_key: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let paystack_secret_key = env::var("PAYSTACK_SECRET_KEY").ok();
        let ai_api_key = env::var("AI_API_KEY").ok();
        let ai_base_url =
            env::var("AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let smtp = match (
            env::var("SMTP_HOST"),
            env::var("SMTP_USERNAME"),
            env::var("SMTP_PASSWORD"),
        ) {
            (Ok(host), Ok(username), Ok(password)) => Some(SmtpConfig {
                host,
                username,
                password,
                from: env::var("SMTP_FROM")
                    .unwrap_or_else(|_| "TradeFair <no-reply@tradefair.app>".to_string()),
            }),
            _ => None,
        };
        Ok(Self {
            database_url,
            host,
            port,
            app_base_url,
            paystack_secret_key,
            ai_api_key,
            ai_base_url,
            smtp,
        })
    }
}
