use academic_credentials::config::CredentialsConfig;

const INSTITUTION_NAME_ENV_VAR: &str = "INSTITUTION_NAME";
const DEFAULT_INSTITUTION_NAME: &str = "Demo University";

pub struct DemoConfig {
    pub credentials: CredentialsConfig,
    pub institution_name: String,
}

impl DemoConfig {
    /// load from env, else local
    pub fn load() -> Self {
        let credentials = CredentialsConfig::load();
        let institution_name = std::env::var(INSTITUTION_NAME_ENV_VAR)
            .unwrap_or(DEFAULT_INSTITUTION_NAME.to_owned());

        Self {
            credentials,
            institution_name,
        }
    }
}
