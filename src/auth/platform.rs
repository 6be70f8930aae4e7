use anyhow::{Result, bail};
use async_trait::async_trait;
use log::debug;

use super::PlatformLogin;
use crate::runtime::Runtime;

/// Environment variable holding a pre-issued one-time login code.
pub const ENV_LOGIN_CODE: &str = "TOKENFLOW_LOGIN_CODE";

/// Terminal login: takes the code from `TOKENFLOW_LOGIN_CODE`, otherwise asks for it.
pub struct PromptLogin<R: Runtime> {
    runtime: R,
}

impl<R: Runtime> PromptLogin<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl<R: Runtime> PlatformLogin for PromptLogin<R> {
    async fn obtain_code(&self) -> Result<String> {
        if let Ok(code) = self.runtime.env_var(ENV_LOGIN_CODE) {
            let code = code.trim().to_string();
            if !code.is_empty() {
                debug!("Using login code from {}", ENV_LOGIN_CODE);
                return Ok(code);
            }
        }

        let code = self.runtime.prompt("Login code")?;
        if code.is_empty() {
            bail!("No login code entered");
        }
        Ok(code)
    }
}
