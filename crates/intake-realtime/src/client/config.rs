use crate::client::consts::BASE_URL;
use secrecy::SecretString;

pub struct Config {
    base_url: String,
    public_key: SecretString,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn with_public_key(mut self, public_key: &str) -> Self {
        self.config.public_key = SecretString::from(public_key.to_string());
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    // Local engine bridge, no key until the builder sets one.
    fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            public_key: SecretString::from(String::new()),
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn public_key(&self) -> &SecretString {
        &self.public_key
    }
}

