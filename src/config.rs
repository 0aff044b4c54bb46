use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub clinical_data_path: PathBuf,
    pub patent_data_path: PathBuf,
    pub market_data_path: PathBuf,
    pub literature_data_path: PathBuf,
    pub reports_dir: PathBuf,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let data_file = |var: &str, default: &str| {
            env::var(var)
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join(default))
        };

        Self {
            port: env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("APP_PORT must be a number"),
            environment: env::var("APP_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            clinical_data_path: data_file("CLINICAL_DATA_PATH", "clinical_trials.json"),
            patent_data_path: data_file("PATENT_DATA_PATH", "patents.json"),
            market_data_path: data_file("MARKET_DATA_PATH", "market_data.json"),
            literature_data_path: data_file("LITERATURE_DATA_PATH", "literature_samples.json"),
            reports_dir: env::var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("outputs").join("reports")),
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "drug-repurposing-analyzer".to_string()),
            otel_exporter_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
