use contracts::usecases::u601_export_from_shopee::DataType;
use once_cell::sync::OnceCell;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub shopee: ShopeeConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Учетные данные приложения на Shopee Open Platform
#[derive(Debug, Deserialize, Clone)]
pub struct ShopeeConfig {
    pub partner_id: i64,
    pub partner_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Домен, на который Shopee вернет OAuth callback
    pub redirect_domain: String,

    /// Максимум повторов при 429 и сетевых сбоях
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Параметры конвейера экспорта
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    /// Ширина чанка дат по умолчанию, дней.
    /// Shopee отдает списки надежно только за ограниченное окно.
    #[serde(default = "default_chunk_days")]
    pub chunk_days: i64,

    /// Переопределение окна для возвратов
    #[serde(default)]
    pub returns_chunk_days: Option<i64>,

    /// Переопределение окна для заказов
    #[serde(default)]
    pub orders_chunk_days: Option<i64>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_returns_page_size")]
    pub returns_page_size: u32,

    /// Жесткий потолок страниц на чанк — защита от зацикливания пагинации
    #[serde(default = "default_max_pages_per_chunk")]
    pub max_pages_per_chunk: u32,

    /// Пауза между страницами, мс (rate limit Shopee)
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Максимальный запрашиваемый период, дней
    #[serde(default = "default_max_range_days")]
    pub max_range_days: i64,

    /// Через сколько часов убирать завершенные задания из памяти
    #[serde(default = "default_job_ttl_hours")]
    pub job_ttl_hours: i64,
}

fn default_port() -> u16 {
    5001
}

fn default_base_url() -> String {
    "https://partner.shopeemobile.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_chunk_days() -> i64 {
    15
}

fn default_page_size() -> u32 {
    100
}

fn default_returns_page_size() -> u32 {
    50
}

fn default_max_pages_per_chunk() -> u32 {
    300
}

fn default_page_delay_ms() -> u64 {
    500
}

fn default_max_range_days() -> i64 {
    365
}

fn default_job_ttl_hours() -> i64 {
    6
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_days: default_chunk_days(),
            returns_chunk_days: None,
            orders_chunk_days: None,
            page_size: default_page_size(),
            returns_page_size: default_returns_page_size(),
            max_pages_per_chunk: default_max_pages_per_chunk(),
            page_delay_ms: default_page_delay_ms(),
            max_range_days: default_max_range_days(),
            job_ttl_hours: default_job_ttl_hours(),
        }
    }
}

impl ExportConfig {
    /// Окно чанка для конкретного типа данных
    pub fn chunk_days_for(&self, data_type: DataType) -> i64 {
        let days = match data_type {
            DataType::Returns | DataType::Combined => {
                self.returns_chunk_days.unwrap_or(self.chunk_days)
            }
            DataType::Orders => self.orders_chunk_days.unwrap_or(self.chunk_days),
            DataType::Products => self.chunk_days,
        };
        days.max(1)
    }
}

/// Значение-заглушка из дефолтного конфига: с ним работать нельзя
const PLACEHOLDER_PARTNER_KEY: &str = "REPLACE_WITH_PARTNER_KEY";

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 5001

[shopee]
partner_id = 0
partner_key = "REPLACE_WITH_PARTNER_KEY"
base_url = "https://partner.shopeemobile.com"
redirect_domain = "http://localhost:5001"

[export]
chunk_days = 15
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Проверка, что учетные данные Shopee реально заданы.
/// Ошибка конфигурации фатальна для всего процесса — без ключей
/// ни один вызов API не пройдет подпись.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.shopee.partner_id <= 0 {
        anyhow::bail!("shopee.partner_id is not set in config.toml");
    }
    if config.shopee.partner_key.is_empty()
        || config.shopee.partner_key == PLACEHOLDER_PARTNER_KEY
    {
        anyhow::bail!("shopee.partner_key is not set in config.toml");
    }
    if config.shopee.redirect_domain.is_empty() {
        anyhow::bail!("shopee.redirect_domain is not set in config.toml");
    }
    Ok(())
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Сохранить конфигурацию процесса (вызывается один раз из main)
pub fn set(config: Config) {
    let _ = CONFIG.set(config);
}

/// Глобальная конфигурация; main обязан вызвать set() до старта сервера
pub fn get() -> &'static Config {
    CONFIG.get().expect("config::set() must be called before config::get()")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.export.chunk_days, 15);
        assert_eq!(config.shopee.max_retries, 3);
    }

    #[test]
    fn test_default_config_fails_validation() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_chunk_days_overrides() {
        let mut export = ExportConfig::default();
        assert_eq!(export.chunk_days_for(DataType::Returns), 15);
        assert_eq!(export.chunk_days_for(DataType::Orders), 15);

        export.returns_chunk_days = Some(3);
        export.orders_chunk_days = Some(7);
        assert_eq!(export.chunk_days_for(DataType::Returns), 3);
        assert_eq!(export.chunk_days_for(DataType::Combined), 3);
        assert_eq!(export.chunk_days_for(DataType::Orders), 7);
        assert_eq!(export.chunk_days_for(DataType::Products), 15);
    }

    #[test]
    fn test_chunk_days_never_below_one() {
        let export = ExportConfig {
            chunk_days: 0,
            ..ExportConfig::default()
        };
        assert_eq!(export.chunk_days_for(DataType::Orders), 1);
    }
}
