use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if placeholder expansion, parsing, or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(
            providers = config.generation.providers.len(),
            max_attempts = config.generation.max_attempts,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing, the default provider is
    /// unknown, the retry budget is zero, or the branding assets are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_providers()?;
        self.validate_branding()?;
        Ok(())
    }

    /// Name of the provider used when a request does not choose one
    pub fn default_provider_name(&self) -> Option<&str> {
        self.generation
            .provider
            .as_deref()
            .or_else(|| self.generation.providers.keys().next().map(String::as_str))
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        let generation = &self.generation;

        if generation.providers.is_empty() {
            anyhow::bail!("at least one generation provider must be configured under [generation.providers]");
        }

        for (name, provider) in &generation.providers {
            let has_key = provider
                .api_key
                .as_ref()
                .is_some_and(|key| !key.expose_secret().trim().is_empty());

            if !has_key {
                anyhow::bail!("generation provider '{name}' has no api_key");
            }
        }

        if let Some(ref default) = generation.provider
            && !generation.providers.contains_key(default)
        {
            anyhow::bail!("generation.provider '{default}' does not name a configured provider");
        }

        if generation.max_attempts == 0 {
            anyhow::bail!("generation.max_attempts must be at least 1");
        }

        if generation.max_image_bytes == 0 {
            anyhow::bail!("generation.max_image_bytes must be greater than 0");
        }

        if generation.attempt_timeout.is_zero() {
            anyhow::bail!("generation.attempt_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_branding(&self) -> anyhow::Result<()> {
        let branding = &self.branding;

        let Some(ref logo_path) = branding.logo_path else {
            anyhow::bail!("branding.logo_path must be set");
        };

        if !logo_path.is_file() {
            anyhow::bail!("branding.logo_path {} does not exist", logo_path.display());
        }

        if branding.banner_text.trim().is_empty() {
            anyhow::bail!("branding.banner_text must not be empty");
        }

        let filename = &branding.download_filename;
        if filename.is_empty() || filename.contains(['/', '\\', '"']) || filename.chars().any(char::is_control) {
            anyhow::bail!("branding.download_filename '{filename}' is not a plain file name");
        }

        Ok(())
    }
}
